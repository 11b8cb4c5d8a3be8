use super::auth::AuthUser;
use crate::application::MediaService;
use crate::domain::DomainError;
use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use quill_contract::{PageQuery, MAX_UPLOAD_BYTES};
use std::sync::Arc;

pub async fn list_media(
    media_service: web::Data<Arc<MediaService>>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = media_service.list(query.cursor()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Multipart form with a `file` part and an optional `post_id` part.
pub async fn upload_media(
    media_service: web::Data<Arc<MediaService>>,
    user: AuthUser,
    mut payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    let mut file: Option<Vec<u8>> = None;
    let mut post_id: Option<i64> = None;

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        tracing::warn!("Multipart error: {}", e);
        DomainError::ValidationError(format!("malformed multipart body: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();
        let mut bytes: Vec<u8> = Vec::new();

        while let Some(chunk) = field.try_next().await.map_err(|e| {
            tracing::warn!("Upload stream error: {}", e);
            DomainError::ValidationError(format!("upload interrupted: {}", e))
        })? {
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(DomainError::PayloadTooLarge(MAX_UPLOAD_BYTES));
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "file" => file = Some(bytes),
            "post_id" => {
                let raw = String::from_utf8_lossy(&bytes);
                let raw = raw.trim();
                if !raw.is_empty() {
                    post_id = Some(raw.parse().map_err(|_| {
                        DomainError::InvalidParam(format!("post_id is not a number: {}", raw))
                    })?);
                }
            }
            other => tracing::debug!("Ignoring multipart field {:?}", other),
        }
    }

    let file = file.ok_or_else(|| DomainError::ValidationError("file part is required".to_string()))?;
    let media = media_service.upload(&user.0, file, post_id).await?;
    Ok(HttpResponse::Created().json(media))
}

/// Serves `/images/{id}.{ext}` without an API key so pages can embed it.
pub async fn get_media_file(
    media_service: web::Data<Arc<MediaService>>,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, DomainError> {
    let (id, ext) = path.into_inner();
    let file = media_service.open(id, &ext).await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, file.kind.mime()))
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        // svg may carry script
        .insert_header((
            header::CONTENT_SECURITY_POLICY,
            "default-src 'none'; style-src 'unsafe-inline'; sandbox",
        ))
        .body(file.bytes))
}
