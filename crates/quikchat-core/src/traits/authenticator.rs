//! Connection credential verification.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::AuthenticatedUser;

/// Turns connection-upgrade credentials into an identity.
///
/// Implementations return an `Authentication` error for anything that does
/// not verify; the upgrade is then refused with 401 before any connection
/// state exists.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Verify a bearer token.
    async fn authenticate(&self, token: &str) -> AppResult<AuthenticatedUser>;
}
