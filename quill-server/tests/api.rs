#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use common::{api, authed, login, unsigned_login, ROOT_ID};
use quill_contract::AUTH_BROKER_HEADER;
use quill_contract::{
    AuthResponse, CommentDto, CreateCommentRequest, CreatePostRequest, ErrorResponse, Page,
    PostDto, Role, UpdateRoleRequest, UserDto,
};

fn new_post(title: &str, content: Option<&str>) -> CreatePostRequest {
    CreatePostRequest {
        title: title.to_string(),
        content: content.map(str::to_string),
        ..Default::default()
    }
}

#[actix_web::test]
async fn api_key_is_required() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/feed").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert!(body.error.contains("API key"));

    let wrong = TestRequest::get()
        .uri("/api/feed")
        .insert_header(("x-api-key", "nope"))
        .to_request();
    let resp = test::call_service(&app, wrong).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, api(TestRequest::get().uri("/api/feed")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn external_login_requires_the_broker_secret() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    // the public API key alone must not mint a token, least of all for a super-admin identity
    let resp = test::call_service(&app, unsigned_login(ROOT_ID, "Root").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert!(body.error.contains("broker"));

    let forged = unsigned_login(ROOT_ID, "Root")
        .insert_header((AUTH_BROKER_HEADER, "test-api-key"))
        .to_request();
    let resp = test::call_service(&app, forged).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let root: AuthResponse =
        test::call_and_read_body_json(&app, login(ROOT_ID, "Root").to_request()).await;
    let users: Page<UserDto> = test::call_and_read_body_json(
        &app,
        authed(TestRequest::get().uri("/api/users"), &root.token).to_request(),
    )
    .await;
    assert_eq!(users.total, 1);
}

#[actix_web::test]
async fn draft_lifecycle_through_publish_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let root: AuthResponse = test::call_and_read_body_json(&app, login(ROOT_ID, "Root").to_request()).await;
    assert_eq!(root.user.role, Role::SuperAdmin);

    let req = authed(TestRequest::post().uri("/api/post"), &root.token)
        .set_json(new_post("First post", Some("hello")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post: PostDto = test::read_body_json(resp).await;
    assert_eq!(post.slug, "first-post");
    assert_eq!(post.published, Some(false));

    let feed: Page<PostDto> =
        test::call_and_read_body_json(&app, api(TestRequest::get().uri("/api/feed")).to_request()).await;
    assert_eq!(feed.total, 0);

    let req = authed(
        TestRequest::put().uri(&format!("/api/publish/{}", post.id)),
        &root.token,
    )
    .to_request();
    let published: PostDto = test::call_and_read_body_json(&app, req).await;
    assert!(published.is_published());

    let feed: Page<PostDto> =
        test::call_and_read_body_json(&app, api(TestRequest::get().uri("/api/feed")).to_request()).await;
    assert_eq!(feed.total, 1);
    assert_eq!(feed.items[0].id, post.id);

    let by_slug: PostDto = test::call_and_read_body_json(
        &app,
        api(TestRequest::get().uri("/api/post/slug/first-post")).to_request(),
    )
    .await;
    assert_eq!(by_slug.id, post.id);

    // toggling again unpublishes
    let req = authed(
        TestRequest::put().uri(&format!("/api/publish/{}", post.id)),
        &root.token,
    )
    .to_request();
    let unpublished: PostDto = test::call_and_read_body_json(&app, req).await;
    assert!(!unpublished.is_published());
}

#[actix_web::test]
async fn writes_need_bearer_and_admin_role() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let no_bearer = api(TestRequest::post().uri("/api/post"))
        .set_json(new_post("x", None))
        .to_request();
    let resp = test::call_service(&app, no_bearer).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let guest: AuthResponse = test::call_and_read_body_json(&app, login("g1", "Guest").to_request()).await;
    assert_eq!(guest.user.role, Role::Guest);

    let req = authed(TestRequest::post().uri("/api/post"), &guest.token)
        .set_json(new_post("x", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn promoted_user_gains_access_without_relogin() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let root: AuthResponse = test::call_and_read_body_json(&app, login(ROOT_ID, "Root").to_request()).await;
    let editor: AuthResponse = test::call_and_read_body_json(&app, login("e1", "Editor").to_request()).await;

    let req = authed(
        TestRequest::put().uri(&format!("/api/users/{}/role", editor.user.id)),
        &editor.token,
    )
    .set_json(UpdateRoleRequest { role: Role::Admin })
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = authed(
        TestRequest::put().uri(&format!("/api/users/{}/role", editor.user.id)),
        &root.token,
    )
    .set_json(UpdateRoleRequest { role: Role::Admin })
    .to_request();
    let updated: UserDto = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated.role, Role::Admin);

    let req = authed(TestRequest::post().uri("/api/post"), &editor.token)
        .set_json(new_post("By editor", None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let users: Page<UserDto> = test::call_and_read_body_json(
        &app,
        authed(TestRequest::get().uri("/api/users"), &editor.token).to_request(),
    )
    .await;
    assert_eq!(users.total, 2);
}

#[actix_web::test]
async fn missing_and_malformed_ids() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let root: AuthResponse = test::call_and_read_body_json(&app, login(ROOT_ID, "Root").to_request()).await;
    let req = authed(TestRequest::post().uri("/api/post"), &root.token)
        .set_json(new_post("Survivor", None))
        .to_request();
    let _: PostDto = test::call_and_read_body_json(&app, req).await;

    let resp = test::call_service(&app, api(TestRequest::get().uri("/api/post/9999")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "Post not found");

    let resp = test::call_service(&app, api(TestRequest::get().uri("/api/post/abc")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = authed(TestRequest::delete().uri("/api/post/9999"), &root.token).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "Post not found");

    let all: Page<PostDto> = test::call_and_read_body_json(
        &app,
        authed(TestRequest::get().uri("/api/posts"), &root.token).to_request(),
    )
    .await;
    assert_eq!(all.total, 1);

    let resp = test::call_service(&app, api(TestRequest::get().uri("/api/feed?take=0")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(&app, api(TestRequest::get().uri("/api/nothing-here")).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn filter_matches_title_or_content() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let root: AuthResponse = test::call_and_read_body_json(&app, login(ROOT_ID, "Root").to_request()).await;
    for (title, content) in [
        ("Ownership", "moves and borrows"),
        ("Traits", "zero-cost abstractions"),
    ] {
        let req = authed(TestRequest::post().uri("/api/post"), &root.token)
            .set_json(new_post(title, Some(content)))
            .to_request();
        let _: PostDto = test::call_and_read_body_json(&app, req).await;
    }

    let hits: Page<PostDto> = test::call_and_read_body_json(
        &app,
        api(TestRequest::get().uri("/api/filter/zero-cost")).to_request(),
    )
    .await;
    assert_eq!(hits.total, 1);
    assert_eq!(hits.items[0].title, "Traits");

    let misses: Page<PostDto> = test::call_and_read_body_json(
        &app,
        api(TestRequest::get().uri("/api/filter/garbage%20collector")).to_request(),
    )
    .await;
    assert_eq!(misses.total, 0);
    assert!(misses.items.is_empty());
}

#[actix_web::test]
async fn feed_pages_partition_the_published_set() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let root: AuthResponse = test::call_and_read_body_json(&app, login(ROOT_ID, "Root").to_request()).await;
    for i in 0..23 {
        let req = authed(TestRequest::post().uri("/api/post"), &root.token)
            .set_json(new_post(&format!("Post {:02}", i), None))
            .to_request();
        let post: PostDto = test::call_and_read_body_json(&app, req).await;
        let req = authed(
            TestRequest::put().uri(&format!("/api/publish/{}", post.id)),
            &root.token,
        )
        .to_request();
        let _: PostDto = test::call_and_read_body_json(&app, req).await;
    }

    let mut seen = Vec::new();
    for (skip, expected) in [(0, 9), (9, 9), (18, 5)] {
        let page: Page<PostDto> = test::call_and_read_body_json(
            &app,
            api(TestRequest::get().uri(&format!("/api/feed?skip={}&take=9", skip))).to_request(),
        )
        .await;
        assert_eq!(page.total, 23);
        assert_eq!(page.items.len(), expected);
        seen.extend(page.items.into_iter().map(|p| p.id));
    }
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 23);

    let by_title: Page<PostDto> = test::call_and_read_body_json(
        &app,
        api(TestRequest::get().uri("/api/feed?take=1&orderBy=title&order=asc")).to_request(),
    )
    .await;
    assert_eq!(by_title.items[0].title, "Post 00");
}

#[actix_web::test]
async fn comments_and_moderation() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let root: AuthResponse = test::call_and_read_body_json(&app, login(ROOT_ID, "Root").to_request()).await;
    let guest: AuthResponse = test::call_and_read_body_json(&app, login("g2", "Reader").to_request()).await;

    let req = authed(TestRequest::post().uri("/api/post"), &root.token)
        .set_json(new_post("Discuss", None))
        .to_request();
    let post: PostDto = test::call_and_read_body_json(&app, req).await;

    let req = authed(
        TestRequest::post().uri(&format!("/api/post/{}/comments", post.id)),
        &guest.token,
    )
    .set_json(CreateCommentRequest {
        message: "Nice".into(),
        chief: true,
    })
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let comment: CommentDto = test::read_body_json(resp).await;
    assert!(!comment.chief);

    let listed: Page<CommentDto> = test::call_and_read_body_json(
        &app,
        api(TestRequest::get().uri(&format!("/api/post/{}/comments", post.id))).to_request(),
    )
    .await;
    assert_eq!(listed.total, 1);

    let resp = test::call_service(
        &app,
        authed(TestRequest::get().uri("/api/comments"), &guest.token).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let moderation: Page<CommentDto> = test::call_and_read_body_json(
        &app,
        authed(TestRequest::get().uri("/api/comments?chief=false"), &root.token).to_request(),
    )
    .await;
    assert_eq!(moderation.total, 1);

    let resp = test::call_service(
        &app,
        authed(
            TestRequest::delete().uri(&format!("/api/comments/{}", comment.id)),
            &root.token,
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = authed(
        TestRequest::post().uri(&format!("/api/post/{}/comments", post.id)),
        &guest.token,
    )
    .set_json(CreateCommentRequest {
        message: String::new(),
        chief: false,
    })
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
