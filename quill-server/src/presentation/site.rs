//! Server-rendered public pages under `/{lang}`.
//!
//! Rendered HTML is kept in a [`PageCache`] until it ages out or the
//! revalidation webhook drops it.

use super::locale::RequestLocale;
use crate::application::{CommentService, MediaService, PostService};
use crate::domain::DomainError;
use crate::infrastructure::PageCache;
use actix_web::http::StatusCode;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use quill_contract::i18n::{t, Key};
use quill_contract::{CommentDto, FeedQuery, Lang, MediaDto, PageCursor, PostDto};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::sync::Arc;

pub const SITE_PAGE_SIZE: i64 = 10;
const POST_PAGE_COMMENTS: i64 = 50;

/// Rendered-page cache plus the invalidation rules the webhook applies.
pub struct SiteCache {
    pages: PageCache,
}

impl SiteCache {
    pub fn new(pages: PageCache) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &PageCache {
        &self.pages
    }

    /// Drops feed pages plus the pages of `slug`, or everything when no
    /// slug is given. Returns the number of dropped pages.
    pub async fn revalidate(&self, slug: Option<&str>) -> usize {
        match slug {
            Some(slug) => {
                let post_suffix = format!("/post/{}", slug);
                self.pages
                    .invalidate_where(|key| !key.contains("/post/") || key.ends_with(&post_suffix))
                    .await
            }
            None => self.pages.clear().await,
        }
    }
}

/// Shared secret the revalidation webhook must present.
pub struct RevalidationToken(pub String);

#[derive(Debug, Deserialize)]
pub struct RevalidateQuery {
    pub token: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    pub dropped: usize,
    pub now: i64,
}

#[derive(Debug, Deserialize)]
pub struct SitePageQuery {
    pub page: Option<i64>,
}

pub async fn revalidate(
    expected: web::Data<RevalidationToken>,
    cache: web::Data<SiteCache>,
    query: web::Query<RevalidateQuery>,
) -> Result<HttpResponse, DomainError> {
    if query.token.as_deref() != Some(expected.0.as_str()) {
        tracing::warn!("Revalidation rejected: token mismatch");
        return Err(DomainError::Unauthorized("Invalid token".to_string()));
    }

    let slug = query.slug.as_deref().filter(|s| !s.is_empty());
    let dropped = cache.revalidate(slug).await;
    tracing::info!("Revalidated {:?}: {} cached pages dropped", slug, dropped);

    Ok(HttpResponse::Ok().json(RevalidateResponse {
        revalidated: true,
        dropped,
        now: chrono::Utc::now().timestamp_millis(),
    }))
}

pub async fn robots() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("User-agent: *\nAllow: /\nDisallow: /api/\n")
}

/// Cache key of a feed page. Only the page number varies the key, so
/// unrelated query parameters cannot multiply entries.
fn feed_key(lang: Lang, page: i64) -> String {
    match page {
        1 => format!("/{}", lang.code()),
        page => format!("/{}?page={}", lang.code(), page),
    }
}

fn post_key(lang: Lang, slug: &str) -> String {
    format!("/{}/post/{}", lang.code(), slug)
}

/// Feed window for a 1-based page number, `None` when it cannot exist.
fn feed_cursor(page: i64) -> Option<PageCursor> {
    let skip = page.checked_sub(1)?.checked_mul(SITE_PAGE_SIZE)?;
    Some(PageCursor::new(skip, SITE_PAGE_SIZE))
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

pub async fn feed_page(
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<SitePageQuery>,
    post_service: web::Data<Arc<PostService>>,
    cache: web::Data<SiteCache>,
) -> Result<HttpResponse, DomainError> {
    let Ok(lang) = path.parse::<Lang>() else {
        return Ok(not_found_page(&req));
    };
    let page = query.page.unwrap_or(1).max(1);
    let Some(cursor) = feed_cursor(page) else {
        return Ok(not_found_page(&req));
    };
    let key = feed_key(lang, page);
    if let Some(body) = cache.pages().get(&key).await {
        return Ok(html(StatusCode::OK, body));
    }

    let posts = post_service.feed(&FeedQuery::default().at(cursor)).await?;
    if page > 1 && posts.items.is_empty() {
        return Ok(not_found_page(&req));
    }
    let has_older = posts.total > cursor.skip.saturating_add(posts.items.len() as i64);

    let body = render_feed(lang, &posts.items, page, has_older);
    cache.pages().insert(key, body.clone()).await;
    Ok(html(StatusCode::OK, body))
}

pub async fn post_page(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    post_service: web::Data<Arc<PostService>>,
    comment_service: web::Data<Arc<CommentService>>,
    media_service: web::Data<Arc<MediaService>>,
    cache: web::Data<SiteCache>,
) -> Result<HttpResponse, DomainError> {
    let (lang, slug) = path.into_inner();
    let Ok(lang) = lang.parse::<Lang>() else {
        return Ok(not_found_page(&req));
    };
    let key = post_key(lang, &slug);
    if let Some(body) = cache.pages().get(&key).await {
        return Ok(html(StatusCode::OK, body));
    }

    let post = match post_service.get_published_by_slug(&slug).await {
        Ok(post) => post,
        Err(DomainError::PostNotFound) => return Ok(not_found_page(&req)),
        Err(e) => return Err(e),
    };
    let comments = comment_service
        .list_for_post(post.id, Some(true), PageCursor::first(POST_PAGE_COMMENTS))
        .await?;
    let thumbnail = match post.thumbnail_id {
        Some(id) => match media_service.get(id).await {
            Ok(media) => Some(media),
            Err(DomainError::MediaNotFound) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };

    let body = render_post(lang, &post, thumbnail.as_ref(), &comments.items);
    cache.pages().insert(key, body.clone()).await;
    Ok(html(StatusCode::OK, body))
}

/// Localized 404 for any unmatched site path.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    not_found_page(&req)
}

fn not_found_page(req: &HttpRequest) -> HttpResponse {
    let lang = req
        .extensions()
        .get::<RequestLocale>()
        .map(|l| l.lang)
        .or_else(|| Lang::from_path(req.path()))
        .unwrap_or(Lang::FALLBACK);

    let mut main = String::new();
    let _ = write!(
        main,
        "<h1>{}</h1><p><a href=\"/{}\">{}</a></p>",
        escape(t(lang, Key::NotFound)),
        lang.code(),
        escape(t(lang, Key::BackHome))
    );
    html(StatusCode::NOT_FOUND, layout(lang, t(lang, Key::NotFound), "", &main))
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(lang: Lang, title: &str, alternate_path: &str, main: &str) -> String {
    let site = t(lang, Key::SiteTitle);
    let mut switch = String::new();
    for other in Lang::SUPPORTED {
        let _ = write!(
            switch,
            "<a hreflang=\"{code}\" href=\"/{code}{path}\"{current}>{code}</a> ",
            code = other.code(),
            path = alternate_path,
            current = if other == lang { " aria-current=\"true\"" } else { "" }
        );
    }

    format!(
        "<!doctype html>\n<html lang=\"{lang}\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title} | {site}</title></head><body>\
         <header><a href=\"/{lang}\">{site}</a><nav>{switch}</nav></header>\
         <main>{main}</main></body></html>",
        lang = lang.code(),
        title = escape(title),
        site = escape(site),
        switch = switch.trim_end(),
        main = main,
    )
}

fn render_feed(lang: Lang, posts: &[PostDto], page: i64, has_older: bool) -> String {
    let mut main = String::new();
    let _ = write!(main, "<h1>{}</h1>", escape(t(lang, Key::LatestPosts)));

    if posts.is_empty() {
        let _ = write!(main, "<p>{}</p>", escape(t(lang, Key::NoPosts)));
    } else {
        main.push_str("<ul class=\"feed\">");
        for post in posts {
            let _ = write!(
                main,
                "<li><a href=\"/{}/post/{}\">{}</a> <time datetime=\"{}\">{}</time>",
                lang.code(),
                escape(&post.slug),
                escape(&post.title),
                post.created_at.to_rfc3339(),
                post.created_at.format("%Y-%m-%d")
            );
            if !post.tags.is_empty() {
                let tags: Vec<String> = post.tags.iter().map(|tag| escape(tag)).collect();
                let _ = write!(main, " <small>{}</small>", tags.join(", "));
            }
            main.push_str("</li>");
        }
        main.push_str("</ul>");
    }

    main.push_str("<nav class=\"pager\">");
    if page > 1 {
        let _ = write!(
            main,
            "<a rel=\"prev\" href=\"/{}?page={}\">{}</a> ",
            lang.code(),
            page - 1,
            escape(t(lang, Key::NewerPosts))
        );
    }
    if has_older {
        let _ = write!(
            main,
            "<a rel=\"next\" href=\"/{}?page={}\">{}</a>",
            lang.code(),
            page.saturating_add(1),
            escape(t(lang, Key::OlderPosts))
        );
    }
    main.push_str("</nav>");

    layout(lang, t(lang, Key::LatestPosts), "", &main)
}

fn render_post(
    lang: Lang,
    post: &PostDto,
    thumbnail: Option<&MediaDto>,
    comments: &[CommentDto],
) -> String {
    let mut main = String::new();
    let _ = write!(
        main,
        "<article><h1>{}</h1><time datetime=\"{}\">{}</time>",
        escape(&post.title),
        post.created_at.to_rfc3339(),
        post.created_at.format("%Y-%m-%d")
    );
    if let Some(media) = thumbnail {
        let _ = write!(main, "<img src=\"{}\" alt=\"\">", media.url_path());
    }
    for paragraph in post
        .content
        .as_deref()
        .unwrap_or_default()
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let _ = write!(main, "<p>{}</p>", escape(paragraph).replace('\n', "<br>"));
    }
    main.push_str("</article>");

    let _ = write!(
        main,
        "<section class=\"comments\"><h2>{}</h2>",
        escape(t(lang, Key::Comments))
    );
    if comments.is_empty() {
        let _ = write!(main, "<p>{}</p>", escape(t(lang, Key::NoComments)));
    } else {
        main.push_str("<ul>");
        for comment in comments {
            let _ = write!(main, "<li>{}</li>", escape(&comment.message));
        }
        main.push_str("</ul>");
    }
    main.push_str("</section>");

    let alternate = format!("/post/{}", escape(&post.slug));
    layout(lang, &post.title, &alternate, &main)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[tokio::test]
    async fn slug_revalidation_keeps_other_posts() {
        let cache = SiteCache::new(PageCache::new(Duration::from_secs(60)));
        cache.pages().insert(feed_key(Lang::En, 1), "feed".into()).await;
        cache.pages().insert(feed_key(Lang::En, 2), "feed 2".into()).await;
        cache.pages().insert(post_key(Lang::En, "a"), "a".into()).await;
        cache.pages().insert(post_key(Lang::Cn, "a"), "a".into()).await;
        cache.pages().insert(post_key(Lang::En, "b"), "b".into()).await;

        assert_eq!(cache.revalidate(Some("a")).await, 4);
        assert!(cache.pages().get("/en/post/b").await.is_some());
        assert_eq!(cache.revalidate(None).await, 1);
        assert!(cache.pages().is_empty());
    }

    #[test]
    fn feed_keys_ignore_everything_but_the_page() {
        assert_eq!(feed_key(Lang::En, 1), "/en");
        assert_eq!(feed_key(Lang::Cn, 3), "/cn?page=3");
    }

    #[test]
    fn unreachable_pages_have_no_cursor() {
        assert_eq!(feed_cursor(1).map(|c| c.skip), Some(0));
        assert_eq!(feed_cursor(3).map(|c| c.skip), Some(20));
        assert!(feed_cursor(i64::MAX).is_none());
        assert!(feed_cursor(i64::MAX / SITE_PAGE_SIZE + 2).is_none());
    }
}
