//! Durable storage for undelivered events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::events::Event;
use crate::result::AppResult;
use crate::types::{EventId, UserId};

/// Relational store of events not yet confirmed by their recipient.
///
/// Inserts are idempotent on the event ID so the buffer sweep can safely
/// re-run after a crash.
#[async_trait]
pub trait DurableEventStore: Send + Sync + 'static {
    /// Insert one event. Inserting an ID that already exists is a no-op.
    async fn insert(&self, event: &Event) -> AppResult<()>;

    /// Insert many events.
    ///
    /// Returns the IDs that are durably stored after the call, including
    /// IDs that were already present. IDs missing from the result failed
    /// and must be retried by the caller.
    async fn insert_batch(&self, events: &[Event]) -> AppResult<Vec<EventId>>;

    /// Events for `recipient` created strictly after `cursor`, ascending by
    /// creation time, at most `limit`.
    async fn fetch_after(
        &self,
        recipient: UserId,
        cursor: Option<DateTime<Utc>>,
        limit: usize,
    ) -> AppResult<Vec<Event>>;

    /// Delete one event addressed to `recipient`. Returns whether a row was
    /// removed.
    async fn delete(&self, recipient: UserId, id: EventId) -> AppResult<bool>;

    /// Delete events by ID. Returns the number of rows removed.
    async fn delete_batch(&self, ids: &[EventId]) -> AppResult<u64>;
}
