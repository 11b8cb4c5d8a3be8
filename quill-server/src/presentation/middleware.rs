use crate::domain::DomainError;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::Error;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use quill_contract::API_KEY_HEADER;
use std::rc::Rc;
use std::sync::Arc;

/// Rejects requests whose `x-api-key` header does not match the configured key.
#[derive(Clone)]
pub struct RequireApiKey {
    key: Arc<str>,
}

impl RequireApiKey {
    pub fn new(key: &str) -> Self {
        Self { key: Arc::from(key) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireApiKey
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireApiKeyMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireApiKeyMiddleware {
            service: Rc::new(service),
            key: self.key.clone(),
        }))
    }
}

pub struct RequireApiKeyMiddleware<S> {
    service: Rc<S>,
    key: Arc<str>,
}

impl<S, B> Service<ServiceRequest> for RequireApiKeyMiddleware<S>
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
        let presented = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        if presented != Some(&*self.key) {
            tracing::warn!(
                "Rejected {} {}: {} API key",
                req.method(),
                req.path(),
                if presented.is_some() { "wrong" } else { "missing" }
            );
            let err = DomainError::Unauthorized("Invalid or missing API key".to_string());
            return Box::pin(ready(Ok(req.error_response(err).map_into_right_body())));
        }

        let svc = self.service.clone();
        Box::pin(async move { Ok(svc.call(req).await?.map_into_left_body()) })
    }
}
