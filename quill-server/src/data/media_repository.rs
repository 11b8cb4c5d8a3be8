use crate::domain::media::NewMedia;
use crate::domain::{DomainError, Media};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn create(&self, media: NewMedia) -> Result<Media, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Media, DomainError>;
    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Media>, i64), DomainError>;
}

const MEDIA_COLUMNS: &str = "id, path, ext, post_id, created_at";

pub struct PostgresMediaRepository {
    pool: PgPool,
}

impl PostgresMediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn media_from_row(row: &PgRow) -> Result<Media, DomainError> {
    Ok(Media {
        id: row.try_get("id")?,
        path: row.try_get("path")?,
        ext: row.try_get("ext")?,
        post_id: row.try_get("post_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl MediaRepository for PostgresMediaRepository {
    async fn create(&self, media: NewMedia) -> Result<Media, DomainError> {
        let sql = format!(
            "INSERT INTO media (path, ext, post_id, created_at) VALUES ($1, $2, $3, NOW()) RETURNING {}",
            MEDIA_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&media.path)
            .bind(&media.ext)
            .bind(media.post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to record media: {}", e);
                DomainError::DatabaseError(e.to_string())
            })?;

        media_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Media, DomainError> {
        let sql = format!("SELECT {} FROM media WHERE id = $1", MEDIA_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => media_from_row(&row),
            None => Err(DomainError::MediaNotFound),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Media>, i64), DomainError> {
        let count_row = sqlx::query("SELECT COUNT(*) AS count FROM media")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let total: i64 = count_row.try_get("count")?;

        let sql = format!(
            "SELECT {} FROM media ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            MEDIA_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let media = rows
            .iter()
            .map(media_from_row)
            .collect::<Result<Vec<Media>, DomainError>>()?;

        Ok((media, total))
    }
}
