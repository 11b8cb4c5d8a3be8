//! Client side of the quill API: a typed HTTP client plus [`Feed`], which
//! pages through any list endpoint with a short-lived page cache.

pub mod cache;
pub mod error;
pub mod feed;
pub mod http_client;

pub use cache::{PageCache, DEFAULT_STALE_AFTER};
pub use error::ClientError;
pub use feed::{
    AllPosts, Comments, Feed, MediaLibrary, PageSource, PublishedPosts, SearchResults, Users,
};
pub use http_client::HttpClient;
pub use quill_contract as contract;
