use super::error::bad_request;
use super::middleware::RequireApiKey;
use super::{http_handlers, media_handlers, site};
use crate::AppServices;
use actix_web::{web, HttpResponse};
use quill_contract::ErrorResponse;

/// Post bodies carry full article text.
const JSON_LIMIT: usize = 1024 * 1024;

async fn api_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new("Not found"))
}

/// Registers the API, the open file and webhook routes, and the site.
pub fn configure(cfg: &mut web::ServiceConfig, services: &AppServices) {
    cfg.app_data(web::Data::new(services.auth.clone()))
        .app_data(web::Data::new(services.posts.clone()))
        .app_data(web::Data::new(services.comments.clone()))
        .app_data(web::Data::new(services.users.clone()))
        .app_data(web::Data::new(services.media.clone()))
        .app_data(services.site_cache.clone())
        .app_data(services.revalidation_token.clone())
        .app_data(web::PathConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(
            web::JsonConfig::default()
                .limit(JSON_LIMIT)
                .error_handler(|err, _| bad_request(err)),
        )
        // open routes, registered ahead of the keyed /api scope
        .route("/api/revalidate", web::get().to(site::revalidate))
        .route(
            r"/api/images/{id:\d+}.{ext}",
            web::get().to(media_handlers::get_media_file),
        )
        .service(
            web::scope("/api")
                .wrap(RequireApiKey::new(&services.api_key))
                .route("/auth/external", web::post().to(http_handlers::external_login))
                .route("/auth/me", web::get().to(http_handlers::me))
                .route("/feed", web::get().to(http_handlers::feed))
                .route("/posts", web::get().to(http_handlers::admin_posts))
                .route("/post", web::post().to(http_handlers::create_post))
                .route("/post/slug/{slug}", web::get().to(http_handlers::get_post_by_slug))
                .service(
                    web::resource("/post/{id}")
                        .route(web::get().to(http_handlers::get_post))
                        .route(web::put().to(http_handlers::update_post))
                        .route(web::delete().to(http_handlers::delete_post)),
                )
                .service(
                    web::resource("/post/{id}/comments")
                        .route(web::get().to(http_handlers::post_comments))
                        .route(web::post().to(http_handlers::create_comment)),
                )
                .route(
                    "/filter/{searchString}",
                    web::get().to(http_handlers::filter_posts),
                )
                .route("/publish/{id}", web::put().to(http_handlers::publish_post))
                .route("/comments", web::get().to(http_handlers::moderation_comments))
                .route("/comments/{id}", web::delete().to(http_handlers::delete_comment))
                .route("/users", web::get().to(http_handlers::list_users))
                .route("/users/{id}/role", web::put().to(http_handlers::set_user_role))
                .service(
                    web::resource("/images")
                        .route(web::get().to(media_handlers::list_media))
                        .route(web::post().to(media_handlers::upload_media)),
                )
                .default_service(web::to(api_not_found)),
        )
        .route("/robots.txt", web::get().to(site::robots))
        .route("/{lang}", web::get().to(site::feed_page))
        .route("/{lang}/", web::get().to(site::feed_page))
        .route("/{lang}/post/{slug}", web::get().to(site::post_page))
        .default_service(web::to(site::not_found));
}
