use crate::domain::comment::{CommentFilter, NewComment};
use crate::domain::{Comment, DomainError};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn list(
        &self,
        filter: CommentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Comment>, i64), DomainError>;
}

const COMMENT_COLUMNS: &str = "id, message, author_id, post_id, chief, created_at";

const COMMENT_FILTER: &str =
    "($1::bigint IS NULL OR post_id = $1) AND ($2::boolean IS NULL OR chief = $2)";

pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn comment_from_row(row: &PgRow) -> Result<Comment, DomainError> {
    Ok(Comment {
        id: row.try_get("id")?,
        message: row.try_get("message")?,
        author_id: row.try_get("author_id")?,
        post_id: row.try_get("post_id")?,
        chief: row.try_get("chief")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO comments (message, author_id, post_id, chief, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&comment.message)
            .bind(comment.author_id)
            .bind(comment.post_id)
            .bind(comment.chief)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create comment: {}", e);
                DomainError::DatabaseError(e.to_string())
            })?;

        comment_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError> {
        let sql = format!("SELECT {} FROM comments WHERE id = $1", COMMENT_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => comment_from_row(&row),
            None => Err(DomainError::CommentNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::CommentNotFound)
        } else {
            Ok(())
        }
    }

    async fn list(
        &self,
        filter: CommentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Comment>, i64), DomainError> {
        let count_sql = format!(
            "SELECT COUNT(*) AS count FROM comments WHERE {}",
            COMMENT_FILTER
        );
        let count_row = sqlx::query(&count_sql)
            .bind(filter.post_id)
            .bind(filter.chief)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let total: i64 = count_row.try_get("count")?;

        let sql = format!(
            "SELECT {} FROM comments WHERE {} ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
            COMMENT_COLUMNS, COMMENT_FILTER
        );
        let rows = sqlx::query(&sql)
            .bind(filter.post_id)
            .bind(filter.chief)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let comments = rows
            .iter()
            .map(comment_from_row)
            .collect::<Result<Vec<Comment>, DomainError>>()?;

        Ok((comments, total))
    }
}
