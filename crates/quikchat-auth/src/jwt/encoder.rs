//! JWT token creation.
//!
//! Production tokens come from the account service. The encoder exists so
//! tests and local tooling can mint tokens the decoder accepts.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use quikchat_core::config::auth::AuthConfig;
use quikchat_core::error::AppError;

use super::claims::Claims;

/// Creates signed HS256 access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl: chrono::Duration,
    issuer: Option<String>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: chrono::Duration::minutes(config.access_ttl_minutes as i64),
            issuer: (!config.issuer.is_empty()).then(|| config.issuer.clone()),
        }
    }

    /// Mint an access token for a user.
    pub fn access_token(&self, user_id: Uuid, username: Option<&str>) -> Result<String, AppError> {
        let now = Utc::now();
        self.sign(&Claims {
            sub: user_id,
            username: username.map(str::to_string),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        })
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))
    }
}
