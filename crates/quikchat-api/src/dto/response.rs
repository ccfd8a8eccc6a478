//! Response DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quikchat_core::events::Event;
use quikchat_realtime::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// One page of undelivered events, oldest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    /// Events in `createdAt` order.
    pub events: Vec<Event>,
    /// Pass back as `cursor` to read the next page; absent on the last one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<DateTime<Utc>>,
}

impl EventPage {
    /// Build a page; a full page means more may follow.
    pub fn new(events: Vec<Event>, limit: usize) -> Self {
        let next_cursor = if events.len() >= limit {
            events.last().map(|e| e.created_at)
        } else {
            None
        };
        Self {
            events,
            next_cursor,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: u64,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealthResponse {
    /// `"ok"` when every probe answered, otherwise `"degraded"`.
    pub status: String,
    /// Probe name to `"up"` or `"down"`.
    pub checks: BTreeMap<String, String>,
    /// Users with a live connection.
    pub online_users: usize,
    /// Engine counters.
    pub metrics: MetricsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quikchat_core::events::{EventPayload, UsernameNotice};
    use quikchat_core::types::UserId;

    fn event() -> Event {
        Event::new(
            UserId::new(),
            None,
            EventPayload::Unfriended(UsernameNotice {
                username: "bob".to_string(),
            }),
        )
    }

    #[test]
    fn test_full_page_carries_cursor() {
        let events = vec![event(), event()];
        let last = events[1].created_at;
        let page = EventPage::new(events, 2);
        assert_eq!(page.next_cursor, Some(last));
    }

    #[test]
    fn test_short_page_has_no_cursor() {
        let page = EventPage::new(vec![event()], 2);
        assert!(page.next_cursor.is_none());
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("nextCursor").is_none());
    }
}
