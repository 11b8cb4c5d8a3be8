use chrono::{DateTime, Utc};
use quill_contract::MediaDto;

#[derive(Debug, Clone)]
pub struct Media {
    pub id: i64,
    /// File name inside the upload directory.
    pub path: String,
    pub ext: String,
    pub post_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub path: String,
    pub ext: String,
    pub post_id: Option<i64>,
}

impl From<Media> for MediaDto {
    fn from(media: Media) -> Self {
        Self {
            id: media.id,
            path: media.path,
            ext: media.ext,
            post_id: media.post_id,
            created_at: media.created_at,
        }
    }
}
