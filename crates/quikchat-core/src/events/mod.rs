//! The real-time event model.
//!
//! An [`Event`] is one fact addressed to exactly one user. Group fan-out
//! produces one event per member; there is never a recipient list.
//!
//! On the wire and in the buffer an event is a single JSON object:
//!
//! ```json
//! {
//!   "id": "0190…",
//!   "type": "message_sent",
//!   "payload": { "id": "…", "content": "hi", "senderId": "…", "recipientId": "…", "timestamp": "…" },
//!   "recipientId": "…",
//!   "senderId": "…",
//!   "createdAt": "2024-05-01T12:00:00Z"
//! }
//! ```

pub mod kind;
pub mod payload;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::{EventId, UserId};

pub use kind::EventKind;
pub use payload::{ChatMessage, EventPayload, GroupNotice, MessageAck, UsernameNotice};

/// A single-recipient deliverable event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique event ID; clients dedup on it.
    pub id: EventId,
    /// Typed payload; serialized as the `type` and `payload` keys.
    #[serde(flatten)]
    pub payload: EventPayload,
    /// The single recipient.
    pub recipient_id: UserId,
    /// Originating user; absent for system events such as acks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<UserId>,
    /// Ordering key and buffer TTL anchor.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event stamped with a fresh ID and the current time.
    pub fn new(recipient_id: UserId, sender_id: Option<UserId>, payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            payload,
            recipient_id,
            sender_id,
            created_at: Utc::now(),
        }
    }

    /// The event's type tag.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Serialize to the outbound wire frame.
    pub fn to_frame(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an event from its JSON form (buffer entries).
    pub fn from_json(raw: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Rebuild an event from its stored columns.
    pub fn from_parts(
        id: EventId,
        kind: &str,
        body: serde_json::Value,
        recipient_id: UserId,
        sender_id: Option<UserId>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            payload: EventPayload::from_parts(kind, body)?,
            recipient_id,
            sender_id,
            created_at,
        })
    }
}

/// Sort events ascending by creation time, breaking ties by ID, and drop
/// duplicate IDs.
pub fn sort_and_dedup(events: &mut Vec<Event>) {
    events.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    let mut seen = std::collections::HashSet::with_capacity(events.len());
    events.retain(|e| seen.insert(e.id));
}
