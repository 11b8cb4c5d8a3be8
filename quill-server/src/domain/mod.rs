pub mod comment;
pub mod error;
pub mod media;
pub mod post;
pub mod user;

pub use comment::Comment;
pub use error::DomainError;
pub use media::Media;
pub use post::Post;
pub use user::{Actor, User};
