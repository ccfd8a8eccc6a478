//! In-memory [`EventBuffer`] for single-node deployments and tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use quikchat_core::config::cache::BufferConfig;
use quikchat_core::events::{self, Event};
use quikchat_core::result::AppResult;
use quikchat_core::traits::EventBuffer;
use quikchat_core::types::{EventId, UserId};

type Slot = (DateTime<Utc>, EventId);

/// DashMap of per-user ordered maps keyed by `(created_at, id)`.
#[derive(Debug, Clone)]
pub struct MemoryEventBuffer {
    users: Arc<DashMap<UserId, BTreeMap<Slot, Event>>>,
    ttl: chrono::Duration,
}

impl MemoryEventBuffer {
    /// Create an empty buffer with the given retention.
    pub fn new(ttl: Duration) -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    fn cutoff(&self) -> DateTime<Utc> {
        Utc::now()
            .checked_sub_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Every live entry across all users, oldest first.
    pub fn snapshot(&self) -> Vec<Event> {
        self.purge_expired();
        let mut all: Vec<Event> = self
            .users
            .iter()
            .flat_map(|entry| entry.value().values().cloned().collect::<Vec<_>>())
            .collect();
        events::sort_and_dedup(&mut all);
        all
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let cutoff = self.cutoff();
        let mut purged = 0;
        self.users.retain(|_, slots| {
            let before = slots.len();
            slots.retain(|(created, _), _| *created >= cutoff);
            purged += before - slots.len();
            !slots.is_empty()
        });
        if purged > 0 {
            debug!(count = purged, "Purged expired buffered events");
        }
        purged
    }
}

impl Default for MemoryEventBuffer {
    fn default() -> Self {
        Self::new(Duration::from_secs(BufferConfig::default().ttl_seconds))
    }
}

#[async_trait]
impl EventBuffer for MemoryEventBuffer {
    async fn append(&self, event: &Event) -> AppResult<()> {
        if event.created_at < self.cutoff() {
            return Ok(());
        }
        self.users
            .entry(event.recipient_id)
            .or_default()
            .insert((event.created_at, event.id), event.clone());
        Ok(())
    }

    async fn read_for_user(&self, user: UserId) -> AppResult<Vec<Event>> {
        let cutoff = self.cutoff();
        let mut found: Vec<Event> = self
            .users
            .get(&user)
            .map(|slots| {
                slots
                    .range((cutoff, EventId::from_uuid(uuid::Uuid::nil()))..)
                    .map(|(_, e)| e.clone())
                    .collect()
            })
            .unwrap_or_default();
        events::sort_and_dedup(&mut found);
        Ok(found)
    }

    async fn clear_for_user(&self, user: UserId) -> AppResult<u64> {
        Ok(self
            .users
            .remove(&user)
            .map(|(_, slots)| slots.len() as u64)
            .unwrap_or(0))
    }

    async fn remove_for_user(&self, user: UserId, id: EventId) -> AppResult<bool> {
        let removed = match self.users.get_mut(&user) {
            Some(mut slots) => {
                let before = slots.len();
                slots.retain(|(_, eid), _| *eid != id);
                before != slots.len()
            }
            None => false,
        };
        self.users.remove_if(&user, |_, slots| slots.is_empty());
        Ok(removed)
    }

    async fn peek_batch(&self, limit: usize) -> AppResult<Vec<Event>> {
        let mut all = self.snapshot();
        all.truncate(limit);
        Ok(all)
    }

    async fn remove(&self, events: &[Event]) -> AppResult<u64> {
        let mut removed = 0u64;
        for event in events {
            let hit = self
                .users
                .get_mut(&event.recipient_id)
                .map(|mut slots| slots.remove(&(event.created_at, event.id)).is_some())
                .unwrap_or(false);
            if hit {
                removed += 1;
            }
            self.users
                .remove_if(&event.recipient_id, |_, slots| slots.is_empty());
        }
        Ok(removed)
    }

    async fn len(&self) -> AppResult<u64> {
        self.purge_expired();
        Ok(self.users.iter().map(|e| e.value().len() as u64).sum())
    }

    async fn ping(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quikchat_core::events::{EventPayload, UsernameNotice};

    fn event_for(user: UserId, age_secs: i64) -> Event {
        let mut event = Event::new(
            user,
            None,
            EventPayload::Unfriended(UsernameNotice {
                username: "dave".to_string(),
            }),
        );
        event.created_at = Utc::now() - chrono::Duration::seconds(age_secs);
        event
    }

    fn buffer() -> MemoryEventBuffer {
        MemoryEventBuffer::new(Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_read_for_user_is_ascending() {
        let buf = buffer();
        let user = UserId::new();
        let newer = event_for(user, 5);
        let older = event_for(user, 50);
        buf.append(&newer).await.unwrap();
        buf.append(&older).await.unwrap();

        let got = buf.read_for_user(user).await.unwrap();
        assert_eq!(got.iter().map(|e| e.id).collect::<Vec<_>>(), vec![older.id, newer.id]);
    }

    #[tokio::test]
    async fn test_expired_events_are_invisible() {
        let buf = buffer();
        let user = UserId::new();
        buf.append(&event_for(user, 7200)).await.unwrap();
        let live = event_for(user, 10);
        buf.append(&live).await.unwrap();

        let got = buf.read_for_user(user).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, live.id);
        assert_eq!(buf.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_for_user_only_touches_that_user() {
        let buf = buffer();
        let a = UserId::new();
        let b = UserId::new();
        buf.append(&event_for(a, 1)).await.unwrap();
        buf.append(&event_for(a, 2)).await.unwrap();
        buf.append(&event_for(b, 3)).await.unwrap();

        assert_eq!(buf.clear_for_user(a).await.unwrap(), 2);
        assert!(buf.read_for_user(a).await.unwrap().is_empty());
        assert_eq!(buf.read_for_user(b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_peek_batch_is_oldest_first_and_non_destructive() {
        let buf = buffer();
        let a = UserId::new();
        let b = UserId::new();
        let oldest = event_for(b, 30);
        buf.append(&event_for(a, 10)).await.unwrap();
        buf.append(&oldest).await.unwrap();
        buf.append(&event_for(a, 20)).await.unwrap();

        let batch = buf.peek_batch(2).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, oldest.id);
        assert_eq!(buf.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_remove_exact_events() {
        let buf = buffer();
        let user = UserId::new();
        let keep = event_for(user, 1);
        let gone = event_for(user, 2);
        buf.append(&keep).await.unwrap();
        buf.append(&gone).await.unwrap();

        assert_eq!(buf.remove(std::slice::from_ref(&gone)).await.unwrap(), 1);
        assert_eq!(buf.remove(std::slice::from_ref(&gone)).await.unwrap(), 0);
        let left = buf.read_for_user(user).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_remove_for_user() {
        let buf = buffer();
        let user = UserId::new();
        let event = event_for(user, 1);
        buf.append(&event).await.unwrap();

        assert!(buf.remove_for_user(user, event.id).await.unwrap());
        assert!(!buf.remove_for_user(user, event.id).await.unwrap());
        assert_eq!(buf.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_default_snapshot_spans_users_oldest_first() {
        let buf = MemoryEventBuffer::default();
        let a = UserId::new();
        let b = UserId::new();
        let newer = event_for(a, 5);
        let older = event_for(b, 60);
        buf.append(&newer).await.unwrap();
        buf.append(&older).await.unwrap();

        let all = buf.snapshot();
        assert_eq!(all.iter().map(|e| e.id).collect::<Vec<_>>(), vec![older.id, newer.id]);
    }
}
