use crate::domain::DomainError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use quill_contract::Role;
use serde::{Deserialize, Serialize};

const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub name: String,
    /// Role at issue time. Requests re-read the stored role.
    pub role: Role,
    pub exp: usize,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        if secret.len() < 32 {
            tracing::warn!(
                "JWT secret is too short ({} chars). Minimum recommended is 32 chars.",
                secret.len()
            );
        }

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn generate_token(&self, user_id: i64, name: &str, role: Role) -> Result<String, DomainError> {
        let expiration = Utc::now()
            .checked_add_signed(Duration::hours(TOKEN_LIFETIME_HOURS))
            .ok_or_else(|| DomainError::InternalError("token expiry overflow".to_string()))?
            .timestamp() as usize;

        let claims = Claims {
            user_id,
            name: name.to_string(),
            role,
            exp: expiration,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {}", e);
            DomainError::InternalError(format!("Failed to generate token: {}", e))
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => {
                tracing::debug!("Token verified for user_id: {}", data.claims.user_id);
                Ok(data.claims)
            }
            Err(e) => {
                tracing::warn!("Token verification failed: {}", e);
                Err(DomainError::Unauthorized("Invalid token".to_string()))
            }
        }
    }
}
