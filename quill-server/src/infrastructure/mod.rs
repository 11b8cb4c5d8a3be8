pub mod config;
pub mod database;
pub mod jwt;
pub mod logging;
pub mod media_store;
pub mod page_cache;

pub use config::{AppConfig, StorageBackend};
pub use jwt::JwtService;
pub use media_store::{FsMediaStore, MediaStore};
pub use page_cache::PageCache;
