use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Media not found")]
    MediaNotFound,

    #[error("Slug already in use: {0}")]
    SlugTaken(String),

    #[error("Forbidden: you don't have permission to perform this action")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upload exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn to_status_code(&self) -> u16 {
        match self {
            Self::UserNotFound | Self::PostNotFound | Self::CommentNotFound | Self::MediaNotFound => {
                404
            }
            Self::SlugTaken(_) => 409,
            Self::Unauthorized(_) => 401,
            Self::Forbidden => 403,
            Self::ValidationError(_) | Self::InvalidParam(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::UnsupportedMedia(_) => 415,
            Self::DatabaseError(_) | Self::InternalError(_) => 500,
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errs: validator::ValidationErrors) -> Self {
        Self::ValidationError(quill_contract::validation_message(&errs))
    }
}
