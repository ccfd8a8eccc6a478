//! Buffer-to-durable-store reconciliation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use quikchat_core::config::worker::WorkerConfig;
use quikchat_core::error::AppError;
use quikchat_core::events::Event;
use quikchat_core::result::AppResult;
use quikchat_core::traits::{DurableEventStore, EventBuffer};

/// Counts from one sweep tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Events read from the buffer
    pub scanned: usize,
    /// Events confirmed in the durable store
    pub migrated: usize,
    /// Events removed from the buffer
    pub removed: u64,
    /// Events left in the buffer for the next tick
    pub failed: usize,
}

/// Moves buffered events into the durable store.
///
/// Each tick inserts first and removes only what the store confirmed, so a
/// crash or a partial failure leaves events in the buffer for the next
/// tick.
pub struct BufferSweep {
    buffer: Arc<dyn EventBuffer>,
    store: Arc<dyn DurableEventStore>,
    batch_size: usize,
    timeout: Duration,
    running: Mutex<()>,
}

impl std::fmt::Debug for BufferSweep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSweep")
            .field("batch_size", &self.batch_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BufferSweep {
    /// Create a new sweep job
    pub fn new(
        buffer: Arc<dyn EventBuffer>,
        store: Arc<dyn DurableEventStore>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            buffer,
            store,
            batch_size: config.sweep_batch_size.max(1),
            timeout: Duration::from_secs(config.sweep_timeout_seconds.max(1)),
            running: Mutex::new(()),
        }
    }

    /// Run one tick under the configured timeout.
    ///
    /// Returns `Ok(None)` when the previous tick is still running.
    pub async fn tick(&self) -> AppResult<Option<SweepReport>> {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("Previous sweep still running, skipping tick");
            return Ok(None);
        };

        let report = tokio::time::timeout(self.timeout, self.run_once())
            .await
            .map_err(|_| {
                AppError::timeout(format!("Buffer sweep exceeded {:?}", self.timeout))
            })??;

        if report.scanned > 0 {
            info!(
                scanned = report.scanned,
                migrated = report.migrated,
                removed = report.removed,
                failed = report.failed,
                "Buffer sweep completed"
            );
        }
        Ok(Some(report))
    }

    /// Run a tick and log failures instead of returning them.
    pub async fn tick_logged(&self) {
        if let Err(e) = self.tick().await {
            error!(error = %e, "Buffer sweep failed, retrying next tick");
        }
    }

    async fn run_once(&self) -> AppResult<SweepReport> {
        let batch = self.buffer.peek_batch(self.batch_size).await?;
        if batch.is_empty() {
            return Ok(SweepReport::default());
        }

        let persisted: HashSet<_> = self.store.insert_batch(&batch).await?.into_iter().collect();
        let migrated: Vec<Event> = batch
            .iter()
            .filter(|e| persisted.contains(&e.id))
            .cloned()
            .collect();

        let failed = batch.len() - migrated.len();
        if failed > 0 {
            warn!(failed = failed, "Some buffered events were not persisted");
        }

        let removed = if migrated.is_empty() {
            0
        } else {
            self.buffer.remove(&migrated).await?
        };

        Ok(SweepReport {
            scanned: batch.len(),
            migrated: migrated.len(),
            removed,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use quikchat_core::events::{EventPayload, UsernameNotice};
    use quikchat_core::types::{EventId, UserId};
    use quikchat_service::testing::{InMemoryEventStore, MemoryEventBuffer};

    fn event(user: UserId) -> Event {
        Event::new(
            user,
            None,
            EventPayload::Unfriended(UsernameNotice {
                username: "eve".to_string(),
            }),
        )
    }

    fn config(batch: usize) -> WorkerConfig {
        WorkerConfig {
            sweep_batch_size: batch,
            sweep_timeout_seconds: 1,
            ..WorkerConfig::default()
        }
    }

    async fn seeded(n: usize) -> (Arc<MemoryEventBuffer>, Vec<Event>) {
        let buffer = Arc::new(MemoryEventBuffer::default());
        let users = [UserId::new(), UserId::new(), UserId::new()];
        let mut events = Vec::new();
        for i in 0..n {
            let e = event(users[i % users.len()]);
            buffer.append(&e).await.unwrap();
            events.push(e);
        }
        (buffer, events)
    }

    #[tokio::test]
    async fn test_tick_migrates_everything() {
        let (buffer, events) = seeded(7).await;
        let store = Arc::new(InMemoryEventStore::default());
        let sweep = BufferSweep::new(buffer.clone(), store.clone(), &config(100));

        let report = sweep.tick().await.unwrap().unwrap();
        assert_eq!(report.scanned, 7);
        assert_eq!(report.migrated, 7);
        assert_eq!(report.removed, 7);
        assert_eq!(report.failed, 0);
        assert_eq!(buffer.len().await.unwrap(), 0);
        assert!(events.iter().all(|e| store.contains(e.id)));
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_failed_events() {
        let (buffer, events) = seeded(6).await;
        let store = Arc::new(InMemoryEventStore::default());
        let failing: Vec<EventId> = vec![events[1].id, events[4].id];
        store.fail_ids(failing.clone());
        let sweep = BufferSweep::new(buffer.clone(), store.clone(), &config(100));

        let report = sweep.tick().await.unwrap().unwrap();
        assert_eq!(report.migrated, 4);
        assert_eq!(report.failed, 2);

        let mut left: Vec<EventId> = buffer.snapshot().iter().map(|e| e.id).collect();
        left.sort();
        let mut expected = failing.clone();
        expected.sort();
        assert_eq!(left, expected);
        assert_eq!(store.count(), 4);

        // Recovered store: the next tick picks them up.
        store.clear_failures();
        sweep.tick().await.unwrap();
        assert_eq!(buffer.len().await.unwrap(), 0);
        assert_eq!(store.count(), 6);
    }

    #[tokio::test]
    async fn test_store_outage_removes_nothing() {
        let (buffer, _) = seeded(3).await;
        let store = Arc::new(InMemoryEventStore::default());
        store.set_unavailable(true);
        let sweep = BufferSweep::new(buffer.clone(), store, &config(100));

        assert!(sweep.tick().await.is_err());
        assert_eq!(buffer.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_batch_size_bounds_one_tick() {
        let (buffer, _) = seeded(5).await;
        let store = Arc::new(InMemoryEventStore::default());
        let sweep = BufferSweep::new(buffer.clone(), store.clone(), &config(2));

        sweep.tick().await.unwrap();
        assert_eq!(buffer.len().await.unwrap(), 3);
        assert_eq!(store.count(), 2);
    }

    #[tokio::test]
    async fn test_rerun_after_crash_is_idempotent() {
        let (buffer, events) = seeded(2).await;
        let store = Arc::new(InMemoryEventStore::default());
        // A previous tick inserted but died before removing.
        store.insert_batch(&events).await.unwrap();
        let sweep = BufferSweep::new(buffer.clone(), store.clone(), &config(10));

        let report = sweep.tick().await.unwrap().unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(store.count(), 2);
    }

    struct StuckStore;

    #[async_trait]
    impl DurableEventStore for StuckStore {
        async fn insert(&self, _event: &Event) -> AppResult<()> {
            std::future::pending().await
        }
        async fn insert_batch(&self, _events: &[Event]) -> AppResult<Vec<EventId>> {
            std::future::pending().await
        }
        async fn fetch_after(
            &self,
            _recipient: UserId,
            _cursor: Option<DateTime<Utc>>,
            _limit: usize,
        ) -> AppResult<Vec<Event>> {
            Ok(Vec::new())
        }
        async fn delete(&self, _recipient: UserId, _id: EventId) -> AppResult<bool> {
            Ok(false)
        }
        async fn delete_batch(&self, _ids: &[EventId]) -> AppResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_store_times_out() {
        let (buffer, _) = seeded(2).await;
        let sweep = Arc::new(BufferSweep::new(buffer.clone(), Arc::new(StuckStore), &config(10)));

        let running = tokio::spawn({
            let sweep = sweep.clone();
            async move { sweep.tick().await }
        });
        tokio::task::yield_now().await;
        assert!(sweep.tick().await.unwrap().is_none());

        let err = running.await.unwrap().unwrap_err();
        assert_eq!(err.kind, quikchat_core::error::ErrorKind::Timeout);
        assert_eq!(buffer.len().await.unwrap(), 2);
    }
}
