use crate::domain::post::{NewPost, PostChanges, PostFilter, PostOrder};
use crate::domain::{DomainError, Post};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, author_id: i64, post: NewPost) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Post, DomainError>;
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError>;
    async fn toggle_published(&self, id: i64) -> Result<Post, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    /// Items and total are computed with the same filter.
    async fn list(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Post>, i64), DomainError>;
}

const POST_COLUMNS: &str =
    "id, title, content, published, author_id, slug, thumbnail_id, tags, created_at, updated_at";

const POST_FILTER: &str = r#"
    ($1::text IS NULL OR title LIKE $1 ESCAPE '\' OR content LIKE $1 ESCAPE '\')
    AND ($2::boolean IS NULL OR COALESCE(published, FALSE) = $2)
"#;

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        published: row.try_get("published")?,
        author_id: row.try_get("author_id")?,
        slug: row.try_get("slug")?,
        thumbnail_id: row.try_get("thumbnail_id")?,
        tags: row.try_get("tags")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// `%term%` with LIKE wildcards in the term escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn map_write_error(err: sqlx::Error, slug: &str) -> DomainError {
    let slug_conflict = err
        .as_database_error()
        .and_then(|db| db.constraint())
        .is_some_and(|c| c == "posts_slug_key");
    if slug_conflict {
        DomainError::SlugTaken(slug.to_string())
    } else {
        tracing::error!("Post write failed: {}", err);
        DomainError::DatabaseError(err.to_string())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, author_id: i64, post: NewPost) -> Result<Post, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO posts (title, content, published, author_id, slug, thumbnail_id, tags, created_at, updated_at)
            VALUES ($1, $2, FALSE, $3, $4, $5, $6, NOW(), NOW())
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&post.title)
            .bind(&post.content)
            .bind(author_id)
            .bind(&post.slug)
            .bind(post.thumbnail_id)
            .bind(&post.tags)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &post.slug))?;

        post_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Post, DomainError> {
        let sql = format!("SELECT {} FROM posts WHERE slug = $1", POST_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError> {
        let sql = format!(
            r#"
            UPDATE posts
            SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                thumbnail_id = COALESCE($3, thumbnail_id),
                tags = COALESCE($4, tags),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(changes.title)
            .bind(changes.content)
            .bind(changes.thumbnail_id)
            .bind(changes.tags)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn toggle_published(&self, id: i64) -> Result<Post, DomainError> {
        let sql = format!(
            r#"
            UPDATE posts
            SET published = NOT COALESCE(published, FALSE), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn list(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Post>, i64), DomainError> {
        let pattern = filter.search.as_deref().map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) AS count FROM posts WHERE {}", POST_FILTER);
        let count_row = sqlx::query(&count_sql)
            .bind(&pattern)
            .bind(filter.published)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let total: i64 = count_row.try_get("count")?;

        // column and direction come from closed enums, never from input text
        let sql = format!(
            "SELECT {} FROM posts WHERE {} ORDER BY {} {}, id {} LIMIT $3 OFFSET $4",
            POST_COLUMNS,
            POST_FILTER,
            order.column(),
            order.direction(),
            order.direction()
        );
        let rows = sqlx::query(&sql)
            .bind(&pattern)
            .bind(filter.published)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let posts = rows
            .iter()
            .map(post_from_row)
            .collect::<Result<Vec<Post>, DomainError>>()?;

        Ok((posts, total))
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
