//! Shapes exchanged between the quill server and its clients.
//!
//! Every crate in the workspace speaks these types, so a field added here is
//! visible to the server handlers, the HTTP client, the CLI and the dashboard
//! at the same time.

pub mod comment;
pub mod error;
pub mod i18n;
pub mod locale;
pub mod media;
pub mod page;
pub mod pager;
pub mod post;
pub mod user;

pub use comment::{CommentDto, CommentQuery, CreateCommentRequest};
pub use error::{validation_message, ErrorResponse};
pub use locale::{Lang, LocaleSource};
pub use media::{MediaDto, MediaKind, MAX_UPLOAD_BYTES};
pub use page::{FeedQuery, Page, PageCursor, PageQuery, SortField, SortOrder};
pub use pager::{FeedPager, FetchTicket, SettleOutcome};
pub use post::{CreatePostRequest, PostDto, UpdatePostRequest};
pub use user::{AuthResponse, ExternalLoginRequest, Role, UpdateRoleRequest, UserDto};

/// Header every API request carries.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Secret the identity broker presents on `POST /api/auth/external`.
/// Unlike the API key it never ships to browsers.
pub const AUTH_BROKER_HEADER: &str = "x-auth-broker-secret";
