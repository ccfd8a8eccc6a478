//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

/// Query for `GET /api/events`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventsQuery {
    /// Only events created strictly after this instant.
    pub cursor: Option<DateTime<Utc>>,
    /// Page size.
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 500, message = "limit must be between 1 and 500"))]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// Query accepted on the WebSocket upgrade.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsQuery {
    /// Access token; browsers cannot set headers on a WebSocket handshake.
    pub token: Option<String>,
}
