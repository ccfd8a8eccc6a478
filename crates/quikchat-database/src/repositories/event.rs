//! Durable event store backed by the `events` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{debug, warn};
use uuid::Uuid;

use quikchat_core::error::{AppError, ErrorKind};
use quikchat_core::events::Event;
use quikchat_core::result::AppResult;
use quikchat_core::traits::DurableEventStore;
use quikchat_core::types::{EventId, UserId};

const INSERT_ONE: &str = "INSERT INTO events (id, type, payload, recipient_id, sender_id, created_at) \
     VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (id) DO NOTHING";

const INSERT_MANY: &str = "INSERT INTO events (id, type, payload, recipient_id, sender_id, created_at) \
     SELECT * FROM UNNEST($1::uuid[], $2::text[], $3::jsonb[], $4::uuid[], $5::uuid[], $6::timestamptz[]) \
     ON CONFLICT (id) DO NOTHING";

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    #[sqlx(rename = "type")]
    kind: String,
    payload: serde_json::Value,
    recipient_id: Uuid,
    sender_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> AppResult<Event> {
        Event::from_parts(
            EventId::from_uuid(self.id),
            &self.kind,
            self.payload,
            UserId::from_uuid(self.recipient_id),
            self.sender_id.map(UserId::from_uuid),
            self.created_at,
        )
    }
}

/// Column-wise arrays for an `UNNEST` batch insert.
#[derive(Default)]
struct EventColumns {
    ids: Vec<Uuid>,
    kinds: Vec<String>,
    payloads: Vec<Json<serde_json::Value>>,
    recipients: Vec<Uuid>,
    senders: Vec<Option<Uuid>>,
    created: Vec<DateTime<Utc>>,
}

impl EventColumns {
    fn push(&mut self, event: &Event) -> AppResult<()> {
        self.payloads.push(Json(event.payload.body()?));
        self.ids.push(event.id.into_uuid());
        self.kinds.push(event.kind().as_str().to_string());
        self.recipients.push(event.recipient_id.into_uuid());
        self.senders.push(event.sender_id.map(UserId::into_uuid));
        self.created.push(event.created_at);
        Ok(())
    }
}

/// PostgreSQL implementation of [`DurableEventStore`].
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Create a new event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert events one by one, collecting the IDs that made it.
    async fn insert_each(&self, events: &[Event]) -> Vec<EventId> {
        let mut stored = Vec::with_capacity(events.len());
        for event in events {
            match self.insert(event).await {
                Ok(()) => stored.push(event.id),
                Err(e) => warn!(event_id = %event.id, error = %e, "Event insert failed"),
            }
        }
        stored
    }
}

#[async_trait]
impl DurableEventStore for PgEventStore {
    async fn insert(&self, event: &Event) -> AppResult<()> {
        let body = event.payload.body()?;
        sqlx::query(INSERT_ONE)
            .bind(event.id.into_uuid())
            .bind(event.kind().as_str())
            .bind(Json(body))
            .bind(event.recipient_id.into_uuid())
            .bind(event.sender_id.map(UserId::into_uuid))
            .bind(event.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert event", e))?;
        Ok(())
    }

    async fn insert_batch(&self, events: &[Event]) -> AppResult<Vec<EventId>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let mut columns = EventColumns::default();
        for event in events {
            columns.push(event)?;
        }

        let result = sqlx::query(INSERT_MANY)
            .bind(&columns.ids)
            .bind(&columns.kinds)
            .bind(&columns.payloads)
            .bind(&columns.recipients)
            .bind(&columns.senders)
            .bind(&columns.created)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                debug!(
                    requested = events.len(),
                    inserted = done.rows_affected(),
                    "Batch event insert complete"
                );
                Ok(events.iter().map(|e| e.id).collect())
            }
            Err(e) => {
                // One bad row fails the whole statement; retry row by row so
                // the good rows still land.
                warn!(
                    count = events.len(),
                    error = %e,
                    "Batch event insert failed, falling back to single inserts"
                );
                let stored = self.insert_each(events).await;
                if stored.is_empty() {
                    return Err(AppError::with_source(
                        ErrorKind::Database,
                        "Failed to insert event batch",
                        e,
                    ));
                }
                Ok(stored)
            }
        }
    }

    async fn fetch_after(
        &self,
        recipient: UserId,
        cursor: Option<DateTime<Utc>>,
        limit: usize,
    ) -> AppResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT id, type, payload, recipient_id, sender_id, created_at FROM events \
             WHERE recipient_id = $1 AND ($2::timestamptz IS NULL OR created_at > $2) \
             ORDER BY created_at ASC, id ASC LIMIT $3",
        )
        .bind(recipient.into_uuid())
        .bind(cursor)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fetch events", e))?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            match row.into_event() {
                Ok(event) => events.push(event),
                Err(e) => warn!(event_id = %id, error = %e, "Skipping undecodable stored event"),
            }
        }
        Ok(events)
    }

    async fn delete(&self, recipient: UserId, id: EventId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND recipient_id = $2")
            .bind(id.into_uuid())
            .bind(recipient.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete event", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_batch(&self, ids: &[EventId]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();
        let result = sqlx::query("DELETE FROM events WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete events", e))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quikchat_core::events::{EventPayload, UsernameNotice};

    fn notice() -> Event {
        Event::new(
            UserId::new(),
            Some(UserId::new()),
            EventPayload::FriendRequestRejected(UsernameNotice {
                username: "carol".to_string(),
            }),
        )
    }

    #[test]
    fn test_columns_stay_aligned() {
        let events = vec![notice(), notice()];
        let mut columns = EventColumns::default();
        for event in &events {
            columns.push(event).expect("push");
        }
        assert_eq!(columns.ids.len(), 2);
        assert_eq!(columns.kinds, vec!["friend_request_rejected"; 2]);
        assert_eq!(columns.payloads[0].0, serde_json::json!({ "username": "carol" }));
        assert_eq!(columns.senders[1], events[1].sender_id.map(UserId::into_uuid));
    }

    #[test]
    fn test_row_decodes_into_event() {
        let event = notice();
        let row = EventRow {
            id: event.id.into_uuid(),
            kind: "friend_request_rejected".to_string(),
            payload: serde_json::json!({ "username": "carol" }),
            recipient_id: event.recipient_id.into_uuid(),
            sender_id: event.sender_id.map(UserId::into_uuid),
            created_at: event.created_at,
        };
        assert_eq!(row.into_event().expect("decode"), event);
    }
}
