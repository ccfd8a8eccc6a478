//! Redis-backed [`EventBuffer`].
//!
//! Event bodies live in plain string keys with `EX` set to the time the
//! event has left before its TTL runs out. Sorted sets scored by
//! `createdAt` (microseconds) index them per user and globally; index
//! entries whose body has expired are pruned lazily on read.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};
use uuid::Uuid;

use quikchat_core::error::{AppError, ErrorKind};
use quikchat_core::events::{self, Event};
use quikchat_core::result::AppResult;
use quikchat_core::traits::EventBuffer;
use quikchat_core::types::{EventId, UserId};

use super::client::RedisClient;
use crate::keys::{BufferKeys, index_member, parse_index_member};

/// Redis implementation of [`EventBuffer`].
#[derive(Debug, Clone)]
pub struct RedisEventBuffer {
    client: RedisClient,
    keys: BufferKeys,
    ttl: Duration,
}

impl RedisEventBuffer {
    /// Create a buffer with the given retention.
    pub fn new(client: RedisClient, ttl: Duration) -> Self {
        let keys = BufferKeys::new(client.prefix());
        Self { client, keys, ttl }
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Cache, format!("Redis error: {e}"), e)
    }

    fn score(event: &Event) -> f64 {
        event.created_at.timestamp_micros() as f64
    }

    /// Seconds the event may still live, or `None` if it is already stale.
    fn remaining_ttl(&self, event: &Event) -> Option<u64> {
        let age = (Utc::now() - event.created_at).to_std().unwrap_or_default();
        self.ttl.checked_sub(age).map(|d| d.as_secs().max(1))
    }

    fn cutoff_score(&self) -> f64 {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now().checked_sub_signed(ttl).unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
        cutoff.timestamp_micros() as f64
    }

    /// Load bodies for `(user, event)` pairs, dropping index entries whose
    /// body has expired. Result keeps input order.
    async fn load(
        &self,
        conn: &mut ConnectionManager,
        pairs: &[(Uuid, Uuid)],
    ) -> AppResult<Vec<Event>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let body_keys: Vec<String> = pairs.iter().map(|(_, e)| self.keys.event(*e)).collect();
        let bodies: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&body_keys)
            .query_async(conn)
            .await
            .map_err(Self::map_err)?;

        let mut events = Vec::with_capacity(pairs.len());
        let mut stale = redis::pipe();
        let mut stale_count = 0usize;

        for ((user, event_id), body) in pairs.iter().zip(bodies) {
            let parsed = body.as_deref().map(Event::from_json);
            match parsed {
                Some(Ok(event)) => events.push(event),
                Some(Err(e)) => {
                    warn!(event_id = %event_id, error = %e, "Dropping undecodable buffered event");
                    stale.cmd("DEL").arg(self.keys.event(*event_id)).ignore();
                    self.queue_unindex(&mut stale, *user, *event_id);
                    stale_count += 1;
                }
                None => {
                    self.queue_unindex(&mut stale, *user, *event_id);
                    stale_count += 1;
                }
            }
        }

        if stale_count > 0 {
            debug!(count = stale_count, "Pruning expired buffer index entries");
            let _: () = stale.query_async(conn).await.map_err(Self::map_err)?;
        }

        Ok(events)
    }

    fn queue_unindex(&self, pipe: &mut redis::Pipeline, user: Uuid, event_id: Uuid) {
        pipe.cmd("ZREM")
            .arg(self.keys.user(user))
            .arg(event_id.to_string())
            .ignore();
        pipe.cmd("ZREM")
            .arg(self.keys.index())
            .arg(index_member(user, event_id))
            .ignore();
    }

    async fn prune_index(&self, conn: &mut ConnectionManager) -> AppResult<()> {
        let _: i64 = redis::cmd("ZREMRANGEBYSCORE")
            .arg(self.keys.index())
            .arg("-inf")
            .arg(format!("({}", self.cutoff_score()))
            .query_async(conn)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}

#[async_trait]
impl EventBuffer for RedisEventBuffer {
    async fn append(&self, event: &Event) -> AppResult<()> {
        let Some(remaining) = self.remaining_ttl(event) else {
            debug!(event_id = %event.id, "Not buffering event past its TTL");
            return Ok(());
        };

        let body = event.to_frame()?;
        let user = event.recipient_id.into_uuid();
        let id = event.id.into_uuid();
        let score = Self::score(event);
        let mut conn = self.client.conn();

        let _: () = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(self.keys.event(id))
            .arg(body)
            .arg("EX")
            .arg(remaining)
            .ignore()
            .cmd("ZADD")
            .arg(self.keys.user(user))
            .arg(score)
            .arg(id.to_string())
            .ignore()
            .cmd("EXPIRE")
            .arg(self.keys.user(user))
            .arg(self.ttl.as_secs())
            .ignore()
            .cmd("ZADD")
            .arg(self.keys.index())
            .arg(score)
            .arg(index_member(user, id))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        debug!(event_id = %id, user_id = %user, "Event buffered");
        Ok(())
    }

    async fn read_for_user(&self, user: UserId) -> AppResult<Vec<Event>> {
        let mut conn = self.client.conn();
        let ids: Vec<String> = redis::cmd("ZRANGE")
            .arg(self.keys.user(user.into_uuid()))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        let pairs: Vec<(Uuid, Uuid)> = ids
            .iter()
            .filter_map(|id| Uuid::parse_str(id).ok())
            .map(|id| (user.into_uuid(), id))
            .collect();

        let mut loaded = self.load(&mut conn, &pairs).await?;
        events::sort_and_dedup(&mut loaded);
        Ok(loaded)
    }

    async fn clear_for_user(&self, user: UserId) -> AppResult<u64> {
        let mut conn = self.client.conn();
        let user_key = self.keys.user(user.into_uuid());
        let ids: Vec<String> = redis::cmd("ZRANGE")
            .arg(&user_key)
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        if ids.is_empty() {
            return Ok(0);
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for id in ids.iter().filter_map(|id| Uuid::parse_str(id).ok()) {
            pipe.cmd("DEL").arg(self.keys.event(id)).ignore();
            pipe.cmd("ZREM")
                .arg(self.keys.index())
                .arg(index_member(user.into_uuid(), id))
                .ignore();
        }
        pipe.cmd("DEL").arg(&user_key).ignore();
        let _: () = pipe.query_async(&mut conn).await.map_err(Self::map_err)?;

        Ok(ids.len() as u64)
    }

    async fn remove_for_user(&self, user: UserId, id: EventId) -> AppResult<bool> {
        let mut conn = self.client.conn();
        let (removed,): (i64,) = redis::pipe()
            .atomic()
            .cmd("ZREM")
            .arg(self.keys.user(user.into_uuid()))
            .arg(id.to_string())
            .cmd("ZREM")
            .arg(self.keys.index())
            .arg(index_member(user.into_uuid(), id.into_uuid()))
            .ignore()
            .cmd("DEL")
            .arg(self.keys.event(id.into_uuid()))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(removed > 0)
    }

    async fn peek_batch(&self, limit: usize) -> AppResult<Vec<Event>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.client.conn();
        self.prune_index(&mut conn).await?;

        let members: Vec<String> = redis::cmd("ZRANGE")
            .arg(self.keys.index())
            .arg(0)
            .arg(limit as i64 - 1)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        let pairs: Vec<(Uuid, Uuid)> = members
            .iter()
            .filter_map(|m| parse_index_member(m))
            .collect();

        self.load(&mut conn, &pairs).await
    }

    async fn remove(&self, events: &[Event]) -> AppResult<u64> {
        if events.is_empty() {
            return Ok(0);
        }
        let mut conn = self.client.conn();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for event in events {
            let user = event.recipient_id.into_uuid();
            let id = event.id.into_uuid();
            self.queue_unindex(&mut pipe, user, id);
            pipe.cmd("DEL").arg(self.keys.event(id));
        }
        let deleted: Vec<i64> = pipe.query_async(&mut conn).await.map_err(Self::map_err)?;
        Ok(deleted.into_iter().filter(|n| *n > 0).count() as u64)
    }

    async fn len(&self) -> AppResult<u64> {
        let mut conn = self.client.conn();
        self.prune_index(&mut conn).await?;
        let count: u64 = redis::cmd("ZCARD")
            .arg(self.keys.index())
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(count)
    }

    async fn ping(&self) -> AppResult<bool> {
        self.client.ping().await
    }
}
