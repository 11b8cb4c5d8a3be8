use quill_contract::ErrorResponse;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    // транспорт
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // ответы сервера
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// Maps a non-success response onto an error, preferring the server's
    /// `{"error": ...}` message over the raw body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|e| e.error)
            .unwrap_or_else(|_| body.trim().to_string());

        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT => ClientError::InvalidRequest(message),
            other => ClientError::Server {
                status: other.as_u16(),
                message,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_extracted() {
        let err = ClientError::from_response(StatusCode::NOT_FOUND, r#"{"error":"Post not found"}"#);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: Post not found");
    }

    #[test]
    fn plain_bodies_and_other_statuses() {
        assert!(matches!(
            ClientError::from_response(StatusCode::CONFLICT, "Slug already in use: x"),
            ClientError::InvalidRequest(m) if m == "Slug already in use: x"
        ));
        assert!(matches!(
            ClientError::from_response(StatusCode::PAYLOAD_TOO_LARGE, ""),
            ClientError::Server { status: 413, .. }
        ));
        assert!(matches!(
            ClientError::from_response(StatusCode::FORBIDDEN, "{}"),
            ClientError::Forbidden(_)
        ));
    }
}
