#![allow(dead_code)]

use actix_web::test::TestRequest;
use quill_contract::{ExternalLoginRequest, API_KEY_HEADER, AUTH_BROKER_HEADER};
use quill_server::infrastructure::AppConfig;
use quill_server::AppServices;
use std::path::Path;

pub const API_KEY: &str = "test-api-key";
pub const BROKER_SECRET: &str = "test-broker-secret";
pub const REVALIDATION_TOKEN: &str = "test-revalidation-token";
/// Identity promoted to super-admin on login.
pub const ROOT_ID: &str = "root";

pub fn test_config(upload_dir: &Path) -> AppConfig {
    let upload_dir = upload_dir.to_string_lossy().to_string();
    AppConfig::from_lookup(move |key| {
        let value = match key {
            "STORAGE_BACKEND" => "memory",
            "JWT_SECRET" => "integration-test-secret-integration-test",
            "API_KEY" => API_KEY,
            "AUTH_BROKER_SECRET" => BROKER_SECRET,
            "REVALIDATION_TOKEN" => REVALIDATION_TOKEN,
            "REVALIDATE_SECONDS" => "300",
            "SUPER_ADMINS" => "test:root",
            "UPLOAD_DIR" => upload_dir.as_str(),
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test config")
}

pub async fn services(upload_dir: &Path) -> AppServices {
    AppServices::from_config(&test_config(upload_dir))
        .await
        .expect("services")
}

/// Builds the full application the way `main` does.
#[macro_export]
macro_rules! test_app {
    ($services:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(quill_server::presentation::LocaleNegotiation::new(
                    &$services.locale_cookie,
                ))
                .configure(|cfg| quill_server::presentation::configure(cfg, &$services)),
        )
        .await
    };
}

/// Request carrying the API key.
pub fn api(req: TestRequest) -> TestRequest {
    req.insert_header((API_KEY_HEADER, API_KEY))
}

pub fn authed(req: TestRequest, token: &str) -> TestRequest {
    api(req).insert_header(("Authorization", format!("Bearer {}", token)))
}

/// External login as the identity broker submits it.
pub fn login(provider_id: &str, name: &str) -> TestRequest {
    unsigned_login(provider_id, name).insert_header((AUTH_BROKER_HEADER, BROKER_SECRET))
}

/// External login carrying only the public API key.
pub fn unsigned_login(provider_id: &str, name: &str) -> TestRequest {
    api(TestRequest::post().uri("/api/auth/external")).set_json(ExternalLoginRequest {
        provider: "test".into(),
        provider_id: provider_id.into(),
        name: name.into(),
        avatar: None,
    })
}
