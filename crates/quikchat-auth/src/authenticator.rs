//! JWT-backed [`Authenticator`].

use async_trait::async_trait;
use tracing::debug;

use quikchat_core::config::auth::AuthConfig;
use quikchat_core::error::AppError;
use quikchat_core::result::AppResult;
use quikchat_core::traits::Authenticator;
use quikchat_core::types::{AuthenticatedUser, UserId};

use crate::jwt::JwtDecoder;

/// Authenticates connections by verifying a bearer JWT.
#[derive(Debug, Clone)]
pub struct JwtAuthenticator {
    decoder: JwtDecoder,
}

impl JwtAuthenticator {
    /// Create an authenticator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoder: JwtDecoder::new(config),
        }
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        if token.is_empty() {
            return Err(AppError::authentication("Missing token"));
        }

        let claims = self.decoder.decode(token)?;
        debug!(user_id = %claims.sub, "Token verified");

        Ok(AuthenticatedUser {
            user_id: UserId::from_uuid(claims.sub),
            username: claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "s3cret".to_string(),
            issuer: String::new(),
            access_ttl_minutes: 15,
            leeway_seconds: 0,
        }
    }

    #[tokio::test]
    async fn test_accepts_bearer_prefix() {
        let user = Uuid::new_v4();
        let token = JwtEncoder::new(&config()).access_token(user, None).unwrap();
        let auth = JwtAuthenticator::new(&config());

        let who = auth.authenticate(&format!("Bearer {token}")).await.unwrap();
        assert_eq!(who.user_id.into_uuid(), user);
    }

    #[tokio::test]
    async fn test_rejects_empty_and_garbage() {
        let auth = JwtAuthenticator::new(&config());
        assert!(auth.authenticate("").await.is_err());
        assert!(auth.authenticate("not-a-jwt").await.is_err());
    }
}
