#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test::{self, TestRequest};
use quill_contract::i18n::{t, Key};
use quill_contract::Lang;

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn root_redirects_to_negotiated_locale() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let req = TestRequest::get()
        .uri("/")
        .insert_header((header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/cn");

    let resp = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;
    assert_eq!(location(&resp), "/en");
}

#[actix_web::test]
async fn cookie_wins_over_header_and_query_survives() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let req = TestRequest::get()
        .uri("/post/hello?ref=feed")
        .insert_header((header::ACCEPT_LANGUAGE, "en-US"))
        .insert_header((header::COOKIE, "lang=cn"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/cn/post/hello?ref=feed");
}

#[actix_web::test]
async fn referer_locale_is_remembered() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let req = TestRequest::get()
        .uri("/en")
        .insert_header((header::REFERER, "http://localhost:8080/cn/post/hello"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "lang")
        .expect("locale cookie");
    assert_eq!(cookie.value(), "cn");

    let req = TestRequest::get()
        .uri("/en")
        .insert_header((header::REFERER, "http://localhost:8080/cn"))
        .insert_header((header::COOKIE, "lang=cn"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[actix_web::test]
async fn passthrough_paths_are_not_localized() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/feed").to_request()).await;
    // rejected by the key check, not redirected
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, TestRequest::get().uri("/robots.txt").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("Disallow: /api/"));
}

#[actix_web::test]
async fn unknown_pages_render_localized_404() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    for (uri, lang) in [("/cn/post/missing", Lang::Cn), ("/en/no/such/page", Lang::En)] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        let body = test::read_body(resp).await;
        let body = std::str::from_utf8(&body).unwrap();
        assert!(body.contains(t(lang, Key::NotFound)), "{}", uri);
        assert!(body.contains(&format!("<html lang=\"{}\"", lang.code())), "{}", uri);
    }
}

#[actix_web::test]
async fn empty_feed_page_renders() {
    let dir = tempfile::tempdir().unwrap();
    let services = common::services(dir.path()).await;
    let app = test_app!(services);

    let resp = test::call_service(&app, TestRequest::get().uri("/cn").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let body = std::str::from_utf8(&body).unwrap();
    assert!(body.contains(t(Lang::Cn, Key::NoPosts)));
}
