//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Bearer token verification settings.
///
/// Tokens are issued by the account service; QuikChat only verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT verification (HMAC-SHA256).
    pub jwt_secret: String,
    /// Expected `iss` claim. Not checked when empty.
    #[serde(default)]
    pub issuer: String,
    /// Lifetime in minutes of tokens minted locally (tests and tooling).
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Clock skew tolerance in seconds when checking `exp`.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

fn default_access_ttl() -> u64 {
    60 * 24
}

fn default_leeway() -> u64 {
    30
}
