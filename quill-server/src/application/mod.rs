pub mod auth_service;
pub mod comment_service;
pub mod media_service;
pub mod post_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use comment_service::CommentService;
pub use media_service::MediaService;
pub use post_service::PostService;
pub use user_service::UserService;

use crate::domain::DomainError;
use quill_contract::page::MAX_TAKE;
use quill_contract::PageCursor;

/// Checks a requested window and returns it as `(limit, offset)`.
pub(crate) fn page_bounds(cursor: PageCursor) -> Result<(i64, i64), DomainError> {
    if !(1..=MAX_TAKE).contains(&cursor.take) {
        return Err(DomainError::InvalidParam(format!(
            "take must be between 1 and {}",
            MAX_TAKE
        )));
    }
    if cursor.skip < 0 {
        return Err(DomainError::InvalidParam(
            "skip cannot be negative".to_string(),
        ));
    }
    Ok((cursor.take, cursor.skip))
}
