use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{middleware::Logger, App, HttpServer};
use dotenvy::dotenv;
use quill_contract::API_KEY_HEADER;
use quill_server::infrastructure::{logging::init_logging, AppConfig};
use quill_server::presentation::{configure, LocaleNegotiation};
use quill_server::AppServices;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let http_addr = format!("0.0.0.0:{}", config.http_port);

    tracing::info!("Starting quill server...");
    tracing::info!("Storage backend: {:?}", config.storage);
    tracing::info!("CORS allowed origins: {:?}", config.cors_allowed_origins);

    let services = AppServices::from_config(&config).await?;
    tracing::info!("Services initialized successfully");

    let origins = config.cors_allowed_origins.clone();
    let server = HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(LocaleNegotiation::new(&services.locale_cookie))
            .wrap(configure_cors(&origins))
            .wrap(Logger::default())
            .configure(|cfg| configure(cfg, &services))
    })
    .bind(&http_addr)?
    .run();

    tracing::info!("HTTP server running on {}", http_addr);
    server.await?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// CORS for the dashboard origins configured in `CORS_ALLOWED_ORIGINS`.
fn configure_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(API_KEY_HEADER),
        ])
        .expose_headers(vec![header::AUTHORIZATION])
        .max_age(3600);

    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
        tracing::debug!("Added allowed CORS origin: {}", origin);
    }

    cors
}
