//! Buffer-first event storage with durable fallback.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use quikchat_core::error::AppError;
use quikchat_core::events::{self, Event};
use quikchat_core::result::AppResult;
use quikchat_core::traits::{DurableEventStore, EventBuffer};
use quikchat_core::types::{EventId, UserId};

/// Where a stored event ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredIn {
    /// The fast buffer; the sweep will migrate it.
    Buffer,
    /// The buffer was unavailable; written straight to the durable store.
    Durable,
}

/// Stores, fetches, and acknowledges undelivered events.
#[derive(Clone)]
pub struct EventService {
    buffer: Arc<dyn EventBuffer>,
    store: Arc<dyn DurableEventStore>,
}

impl EventService {
    /// Creates a new event service.
    pub fn new(buffer: Arc<dyn EventBuffer>, store: Arc<dyn DurableEventStore>) -> Self {
        Self { buffer, store }
    }

    /// The buffer this service writes to.
    pub fn buffer(&self) -> &Arc<dyn EventBuffer> {
        &self.buffer
    }

    /// The durable store behind the buffer.
    pub fn durable(&self) -> &Arc<dyn DurableEventStore> {
        &self.store
    }

    /// Persist an event before delivery is attempted.
    ///
    /// Tries the buffer, then the durable store. Fails only when neither
    /// accepted the event.
    pub async fn store(&self, event: &Event) -> AppResult<StoredIn> {
        let buffer_err = match self.buffer.append(event).await {
            Ok(()) => return Ok(StoredIn::Buffer),
            Err(e) => e,
        };

        warn!(
            event_id = %event.id,
            user_id = %event.recipient_id,
            error = %buffer_err,
            "Buffer append failed, writing event to durable store"
        );

        match self.store.insert(event).await {
            Ok(()) => Ok(StoredIn::Durable),
            Err(durable_err) => Err(AppError::service_unavailable(format!(
                "Event {} could not be stored: buffer: {}; durable: {}",
                event.id, buffer_err.message, durable_err.message
            ))),
        }
    }

    /// Undelivered events for `user` created after `cursor`, ascending,
    /// at most `limit`.
    ///
    /// Merges the durable store with the buffer; an event the sweep is
    /// migrating may appear in both and is returned once.
    pub async fn fetch_undelivered(
        &self,
        user: UserId,
        cursor: Option<DateTime<Utc>>,
        limit: usize,
    ) -> AppResult<Vec<Event>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let durable = self.store.fetch_after(user, cursor, limit).await;
        let buffered = self.buffer.read_for_user(user).await;

        let mut merged = match (durable, buffered) {
            (Ok(mut d), Ok(b)) => {
                d.extend(b);
                d
            }
            (Ok(d), Err(e)) => {
                warn!(user_id = %user, error = %e, "Buffer read failed, returning durable events only");
                d
            }
            (Err(e), Ok(b)) => {
                warn!(user_id = %user, error = %e, "Durable fetch failed, returning buffered events only");
                b
            }
            (Err(durable_err), Err(_)) => return Err(durable_err),
        };

        if let Some(cursor) = cursor {
            merged.retain(|e| e.created_at > cursor);
        }
        events::sort_and_dedup(&mut merged);
        merged.truncate(limit);

        debug!(user_id = %user, count = merged.len(), "Fetched undelivered events");
        Ok(merged)
    }

    /// Drop an event the recipient confirmed. Returns whether anything was
    /// removed.
    pub async fn acknowledge(&self, user: UserId, id: EventId) -> AppResult<bool> {
        let from_buffer = self.buffer.remove_for_user(user, id).await;
        let from_store = self.store.delete(user, id).await;

        match (from_buffer, from_store) {
            (Ok(b), Ok(d)) => Ok(b || d),
            (Ok(b), Err(e)) => {
                warn!(event_id = %id, error = %e, "Durable delete failed during acknowledgement");
                Ok(b)
            }
            (Err(e), Ok(d)) => {
                warn!(event_id = %id, error = %e, "Buffer delete failed during acknowledgement");
                Ok(d)
            }
            (Err(_), Err(e)) => Err(e),
        }
    }
}
