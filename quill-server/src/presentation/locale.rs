//! Locale negotiation for the public site.
//!
//! Site paths always start with a supported locale. A request without one
//! is redirected to the negotiated locale (cookie, then `Accept-Language`,
//! then the fallback). Navigation from a page in another locale is
//! remembered by rewriting the locale cookie from the `Referer`.

use actix_web::body::EitherBody;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{header, StatusCode, Uri};
use actix_web::{Error, HttpMessage, HttpResponse};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use quill_contract::locale::negotiate;
use quill_contract::{Lang, LocaleSource};
use std::rc::Rc;

/// Paths served as-is, never localized.
const PASSTHROUGH_PREFIXES: [&str; 4] = ["/api", "/assets", "/favicon.ico", "/robots.txt"];

/// Locale picked for a request, available to handlers through extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLocale {
    pub lang: Lang,
    pub source: LocaleSource,
}

#[derive(Clone)]
pub struct LocaleNegotiation {
    cookie_name: Rc<str>,
}

impl LocaleNegotiation {
    pub fn new(cookie_name: &str) -> Self {
        Self {
            cookie_name: Rc::from(cookie_name),
        }
    }
}

fn is_passthrough(path: &str) -> bool {
    PASSTHROUGH_PREFIXES.iter().any(|prefix| {
        path == *prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// `/{lang}{path}` with the query string kept.
pub fn localized_location(lang: Lang, path: &str, query: &str) -> String {
    let mut location = format!("/{}", lang.code());
    if path != "/" {
        location.push_str(path);
    }
    if !query.is_empty() {
        location.push('?');
        location.push_str(query);
    }
    location
}

fn referer_locale(req: &ServiceRequest) -> Option<Lang> {
    let referer = req.headers().get(header::REFERER)?.to_str().ok()?;
    let uri: Uri = referer.parse().ok()?;
    Lang::from_path(uri.path())
}

fn locale_cookie(name: &str, lang: Lang) -> Cookie<'static> {
    Cookie::build(name.to_string(), lang.code())
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(365))
        .finish()
}

impl<S, B> Transform<S, ServiceRequest> for LocaleNegotiation
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = LocaleNegotiationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LocaleNegotiationMiddleware {
            service: Rc::new(service),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct LocaleNegotiationMiddleware<S> {
    service: Rc<S>,
    cookie_name: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for LocaleNegotiationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        if is_passthrough(req.path()) {
            return Box::pin(async move { Ok(svc.call(req).await?.map_into_left_body()) });
        }

        let cookie = req.cookie(&self.cookie_name).map(|c| c.value().to_string());
        let accept = req
            .headers()
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let (negotiated, source) = negotiate(cookie.as_deref(), accept.as_deref());

        let Some(path_lang) = Lang::from_path(req.path()) else {
            let location = localized_location(negotiated, req.path(), req.query_string());
            tracing::debug!(
                "Redirecting {} to {} (locale from {:?})",
                req.path(),
                location,
                source
            );
            let response = HttpResponse::build(StatusCode::TEMPORARY_REDIRECT)
                .insert_header((header::LOCATION, location))
                .finish()
                .map_into_right_body();
            return Box::pin(ready(Ok(req.into_response(response))));
        };

        req.extensions_mut().insert(RequestLocale {
            lang: path_lang,
            source,
        });

        let cookie_lang = cookie.as_deref().and_then(Lang::from_tag);
        let remember = referer_locale(&req).filter(|lang| Some(*lang) != cookie_lang);
        let cookie_name = self.cookie_name.clone();

        Box::pin(async move {
            let mut res = svc.call(req).await?;
            if let Some(lang) = remember {
                tracing::debug!("Updating locale cookie to {} from referer", lang);
                if let Err(e) = res.response_mut().add_cookie(&locale_cookie(&cookie_name, lang)) {
                    tracing::warn!("Failed to set locale cookie: {}", e);
                }
            }
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_prefixes_match_whole_segments() {
        assert!(is_passthrough("/api/feed"));
        assert!(is_passthrough("/assets/site.css"));
        assert!(is_passthrough("/favicon.ico"));
        assert!(!is_passthrough("/apiary"));
        assert!(!is_passthrough("/en/post/assets"));
    }

    #[test]
    fn location_keeps_path_and_query() {
        assert_eq!(localized_location(Lang::Cn, "/", ""), "/cn");
        assert_eq!(
            localized_location(Lang::En, "/post/hello", "page=2"),
            "/en/post/hello?page=2"
        );
    }
}
