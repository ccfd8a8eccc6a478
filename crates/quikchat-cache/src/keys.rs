//! Key builders for the Redis buffer layout.
//!
//! Layout under the configured prefix:
//!
//! - `buffer:event:{event_id}`: event JSON, expires with the event
//! - `buffer:user:{user_id}`: sorted set of event IDs scored by `createdAt`
//! - `buffer:index`: sorted set of `{user_id}:{event_id}` across all users

use uuid::Uuid;

/// Builds fully prefixed buffer keys.
#[derive(Debug, Clone)]
pub struct BufferKeys {
    prefix: String,
}

impl BufferKeys {
    /// Create a key builder with the given prefix (e.g. `"quikchat:"`).
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Key holding one event's JSON.
    pub fn event(&self, event_id: Uuid) -> String {
        format!("{}buffer:event:{event_id}", self.prefix)
    }

    /// Per-user sorted set of buffered event IDs.
    pub fn user(&self, user_id: Uuid) -> String {
        format!("{}buffer:user:{user_id}", self.prefix)
    }

    /// Global sorted set used by the sweep.
    pub fn index(&self) -> String {
        format!("{}buffer:index", self.prefix)
    }
}

/// Member stored in the global index.
pub fn index_member(user_id: Uuid, event_id: Uuid) -> String {
    format!("{user_id}:{event_id}")
}

/// Split an index member back into user and event IDs.
pub fn parse_index_member(member: &str) -> Option<(Uuid, Uuid)> {
    let (user, event) = member.split_once(':')?;
    Some((Uuid::parse_str(user).ok()?, Uuid::parse_str(event).ok()?))
}
