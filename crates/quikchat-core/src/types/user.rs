//! User projections consumed by the delivery core.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Public profile projection used to enrich notification payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User ID.
    pub id: UserId,
    /// Current username.
    pub username: String,
    /// Avatar reference, empty when unset.
    #[serde(default)]
    pub profile_pic_url: String,
}

/// Identity established by the authenticator before a connection exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Authenticated user ID.
    pub user_id: UserId,
    /// Username carried in the token, if any.
    pub username: Option<String>,
}
