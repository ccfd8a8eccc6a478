//! Fast, TTL-bounded event buffer.

use async_trait::async_trait;

use crate::events::Event;
use crate::result::AppResult;
use crate::types::{EventId, UserId};

/// Short-retention holding area keyed by recipient.
///
/// Entries expire once they are older than the configured TTL, measured
/// from their `created_at`. The sweep drains the buffer into the
/// [`DurableEventStore`](super::DurableEventStore).
#[async_trait]
pub trait EventBuffer: Send + Sync + 'static {
    /// Append an event under its recipient.
    async fn append(&self, event: &Event) -> AppResult<()>;

    /// All live events for a user, ascending by creation time.
    async fn read_for_user(&self, user: UserId) -> AppResult<Vec<Event>>;

    /// Drop every buffered event for a user. Returns the number removed.
    async fn clear_for_user(&self, user: UserId) -> AppResult<u64>;

    /// Drop one event for a user. Returns whether it was buffered.
    async fn remove_for_user(&self, user: UserId, id: EventId) -> AppResult<bool>;

    /// Up to `limit` of the oldest live events across all users.
    ///
    /// Does not remove anything.
    async fn peek_batch(&self, limit: usize) -> AppResult<Vec<Event>>;

    /// Remove exactly these events. Returns the number removed.
    async fn remove(&self, events: &[Event]) -> AppResult<u64>;

    /// Number of live events across all users.
    async fn len(&self) -> AppResult<u64>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> AppResult<bool>;
}
