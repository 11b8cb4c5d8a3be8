use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Runtime settings read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub storage: StorageBackend,
    pub jwt_secret: String,
    pub api_key: String,
    /// Held by the identity broker only; gates external login.
    pub auth_broker_secret: String,
    pub revalidation_token: String,
    pub http_port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub upload_dir: PathBuf,
    pub revalidate_after: Duration,
    pub locale_cookie: String,
    /// `provider:provider_id` identities promoted to super-admin on login.
    pub super_admins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} must be set", key))
        };

        let storage = match lookup("STORAGE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => return Err(anyhow!("unknown STORAGE_BACKEND: {}", other)),
        };

        let database_url = match storage {
            StorageBackend::Postgres => Some(required("DATABASE_URL")?),
            StorageBackend::Memory => lookup("DATABASE_URL"),
        };

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .map(|v| v.parse())
            .transpose()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?
            .unwrap_or(5);

        let http_port = lookup("HTTP_PORT")
            .map(|v| v.parse())
            .transpose()
            .context("HTTP_PORT must be a port number")?
            .unwrap_or(3000);

        let revalidate_seconds: u64 = lookup("REVALIDATE_SECONDS")
            .map(|v| v.parse())
            .transpose()
            .context("REVALIDATE_SECONDS must be a number of seconds")?
            .unwrap_or(60);

        Ok(Self {
            database_url,
            database_max_connections,
            storage,
            jwt_secret: required("JWT_SECRET")?,
            api_key: required("API_KEY")?,
            auth_broker_secret: required("AUTH_BROKER_SECRET")?,
            revalidation_token: required("REVALIDATION_TOKEN")?,
            http_port,
            cors_allowed_origins: split_list(
                &lookup("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|| "http://localhost:8000,http://127.0.0.1:8000".to_string()),
            ),
            upload_dir: PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".to_string())),
            revalidate_after: Duration::from_secs(revalidate_seconds),
            locale_cookie: lookup("LOCALE_COOKIE").unwrap_or_else(|| "lang".to_string()),
            super_admins: split_list(&lookup("SUPER_ADMINS").unwrap_or_default()),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
