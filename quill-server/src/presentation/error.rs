use crate::domain::DomainError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use quill_contract::ErrorResponse;

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.to_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorResponse::new(message))
    }
}

/// Maps extractor failures (bad path segment, query or JSON body) to 400.
pub fn bad_request(err: impl std::fmt::Display) -> actix_web::Error {
    DomainError::InvalidParam(err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn internal_errors_hide_details() {
        let resp = DomainError::DatabaseError("connection refused".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Internal server error");
    }

    #[actix_rt::test]
    async fn not_found_carries_message() {
        let resp = DomainError::PostNotFound.error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "Post not found");
    }
}
