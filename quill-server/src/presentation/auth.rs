use crate::application::AuthService;
use crate::domain::{Actor, DomainError};
use actix_web::dev::Payload;
use actix_web::http::header::Header;
use actix_web::{web, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures_util::future::LocalBoxFuture;
use std::sync::Arc;

/// Authenticated caller resolved from `Authorization: Bearer <jwt>`.
///
/// Handlers that take this extractor are protected; role checks happen in
/// the services through [`Actor::require`].
pub struct AuthUser(pub Actor);

impl FromRequest for AuthUser {
    type Error = DomainError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = Authorization::<Bearer>::parse(req)
            .map(|auth| auth.into_scheme().token().to_string());
        let auth_service = req.app_data::<web::Data<Arc<AuthService>>>().cloned();

        Box::pin(async move {
            let token = token
                .map_err(|_| DomainError::Unauthorized("Bearer token required".to_string()))?;
            let auth_service = auth_service.ok_or_else(|| {
                DomainError::InternalError("auth service not configured".to_string())
            })?;

            let actor = auth_service.authenticate(&token).await?;
            Ok(AuthUser(actor))
        })
    }
}
