#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use common::{authed, login, REVALIDATION_TOKEN, ROOT_ID};
use quill_contract::{AuthResponse, CreatePostRequest, PostDto, UpdatePostRequest};
use quill_server::domain::Actor;
use quill_server::presentation::site::RevalidateResponse;

/// Body of a site page that must render successfully.
macro_rules! page_text {
    ($app:expr, $uri:expr) => {{
        let uri: &str = $uri;
        let resp = test::call_service($app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
    }};
}

#[actix_web::test]
async fn webhook_requires_the_shared_token() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/revalidate").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/revalidate?token=wrong").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: RevalidateResponse = test::call_and_read_body_json(
        &app,
        TestRequest::get()
            .uri(&format!("/api/revalidate?token={}", REVALIDATION_TOKEN))
            .to_request(),
    )
    .await;
    assert!(body.revalidated);
    assert!(body.now > 0);
}

#[actix_web::test]
async fn cached_pages_stay_stale_until_revalidated() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let root: AuthResponse = test::call_and_read_body_json(&app, login(ROOT_ID, "Root").to_request()).await;
    let req = authed(TestRequest::post().uri("/api/post"), &root.token)
        .set_json(CreatePostRequest {
            title: "Cached title".into(),
            content: Some("body".into()),
            ..Default::default()
        })
        .to_request();
    let post: PostDto = test::call_and_read_body_json(&app, req).await;
    let req = authed(
        TestRequest::put().uri(&format!("/api/publish/{}", post.id)),
        &root.token,
    )
    .to_request();
    let _: PostDto = test::call_and_read_body_json(&app, req).await;

    let post_uri = format!("/en/post/{}", post.slug);
    assert!(page_text!(&app, "/en").contains("Cached title"));
    assert!(page_text!(&app, &post_uri).contains("Cached title"));

    // bypasses the HTTP handlers, so nothing invalidates the rendered pages
    let actor = Actor {
        id: root.user.id,
        role: root.user.role,
    };
    services
        .posts
        .update_post(
            &actor,
            post.id,
            UpdatePostRequest {
                title: Some("Fresh title".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(page_text!(&app, "/en").contains("Cached title"));
    assert!(page_text!(&app, &post_uri).contains("Cached title"));

    let body: RevalidateResponse = test::call_and_read_body_json(
        &app,
        TestRequest::get()
            .uri(&format!(
                "/api/revalidate?token={}&slug={}",
                REVALIDATION_TOKEN, post.slug
            ))
            .to_request(),
    )
    .await;
    assert_eq!(body.dropped, 2);

    assert!(page_text!(&app, "/en").contains("Fresh title"));
    assert!(page_text!(&app, &post_uri).contains("Fresh title"));
}

#[actix_web::test]
async fn api_writes_refresh_the_site() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let root: AuthResponse = test::call_and_read_body_json(&app, login(ROOT_ID, "Root").to_request()).await;
    assert!(!page_text!(&app, "/cn").contains("Announcement"));

    let req = authed(TestRequest::post().uri("/api/post"), &root.token)
        .set_json(CreatePostRequest {
            title: "Announcement".into(),
            ..Default::default()
        })
        .to_request();
    let post: PostDto = test::call_and_read_body_json(&app, req).await;
    let req = authed(
        TestRequest::put().uri(&format!("/api/publish/{}", post.id)),
        &root.token,
    )
    .to_request();
    let _: PostDto = test::call_and_read_body_json(&app, req).await;

    assert!(page_text!(&app, "/cn").contains("Announcement"));
}

#[actix_web::test]
async fn feed_pages_past_the_end_are_localized_404s() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    for uri in [
        "/en?page=9223372036854775807",
        "/en?page=922337203685477581",
        "/cn?page=2",
    ] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
    assert!(services.site_cache.pages().is_empty());

    // page 1 of an empty site still renders
    assert!(page_text!(&app, "/en?page=0").contains("<h1>"));
}

#[actix_web::test]
async fn unrelated_query_parameters_share_one_cached_page() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let first = page_text!(&app, "/en");
    for noise in ["/en?utm=1", "/en?x=2&page=1", "/en?page=1&cachebust=3"] {
        assert_eq!(page_text!(&app, noise), first);
    }
    assert_eq!(services.site_cache.pages().len(), 1);
}
