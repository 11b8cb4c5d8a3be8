//! Quill content server: JSON API, media files, and the server-rendered
//! public site.

pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

use actix_web::web;
use anyhow::Context;
use application::{AuthService, CommentService, MediaService, PostService, UserService};
use data::{
    CommentRepository, InMemoryStore, MediaRepository, PostRepository, PostgresCommentRepository,
    PostgresMediaRepository, PostgresPostRepository, PostgresUserRepository, UserRepository,
};
use infrastructure::{
    database::{create_pool, run_migrations},
    AppConfig, FsMediaStore, JwtService, MediaStore, PageCache, StorageBackend,
};
use presentation::site::{RevalidationToken, SiteCache};
use std::sync::Arc;

/// One implementation per repository trait.
pub struct Repositories {
    pub posts: Arc<dyn PostRepository + Send + Sync>,
    pub users: Arc<dyn UserRepository + Send + Sync>,
    pub comments: Arc<dyn CommentRepository + Send + Sync>,
    pub media: Arc<dyn MediaRepository + Send + Sync>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentRepository::new(pool.clone())),
            media: Arc::new(PostgresMediaRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            posts: store.clone(),
            users: store.clone(),
            comments: store.clone(),
            media: store,
        }
    }
}

/// Everything the HTTP layer needs, shared across workers.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub users: Arc<UserService>,
    pub media: Arc<MediaService>,
    pub site_cache: web::Data<SiteCache>,
    pub revalidation_token: web::Data<RevalidationToken>,
    pub api_key: String,
    pub locale_cookie: String,
}

impl AppServices {
    pub fn new(repos: Repositories, files: Arc<dyn MediaStore>, config: &AppConfig) -> Self {
        let jwt_service = Arc::new(JwtService::new(&config.jwt_secret));

        Self {
            auth: Arc::new(AuthService::new(
                repos.users.clone(),
                jwt_service,
                config.auth_broker_secret.clone(),
                config.super_admins.iter().cloned(),
            )),
            posts: Arc::new(PostService::new(repos.posts.clone(), repos.media.clone())),
            comments: Arc::new(CommentService::new(
                repos.comments.clone(),
                repos.posts.clone(),
            )),
            users: Arc::new(UserService::new(repos.users.clone())),
            media: Arc::new(MediaService::new(repos.media, repos.posts, files)),
            site_cache: web::Data::new(SiteCache::new(PageCache::new(config.revalidate_after))),
            revalidation_token: web::Data::new(RevalidationToken(
                config.revalidation_token.clone(),
            )),
            api_key: config.api_key.clone(),
            locale_cookie: config.locale_cookie.clone(),
        }
    }

    /// Wires the configured storage backend, running migrations for Postgres.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let repos = match config.storage {
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set for the postgres backend")?;
                tracing::info!("Connecting to database...");
                let pool = create_pool(url, config.database_max_connections).await?;
                run_migrations(&pool).await?;
                Repositories::postgres(pool)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Repositories::in_memory()
            }
        };

        let files = Arc::new(FsMediaStore::new(&config.upload_dir).await?);
        Ok(Self::new(repos, files, config))
    }
}
