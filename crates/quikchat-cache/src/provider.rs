//! Buffer manager that dispatches to the configured backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use quikchat_core::config::cache::CacheConfig;
use quikchat_core::error::AppError;
use quikchat_core::events::Event;
use quikchat_core::result::AppResult;
use quikchat_core::traits::EventBuffer;
use quikchat_core::types::{EventId, UserId};

/// Event buffer wrapping the backend selected by `cache.provider`.
#[derive(Clone)]
pub struct BufferManager {
    inner: Arc<dyn EventBuffer>,
    backend: &'static str,
}

impl std::fmt::Debug for BufferManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferManager")
            .field("backend", &self.backend)
            .finish()
    }
}

impl BufferManager {
    /// Build the configured backend.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let ttl = Duration::from_secs(config.buffer.ttl_seconds);
        match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!(ttl_seconds = ttl.as_secs(), "Initializing Redis event buffer");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Ok(Self {
                    inner: Arc::new(crate::redis::RedisEventBuffer::new(client, ttl)),
                    backend: "redis",
                })
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!(ttl_seconds = ttl.as_secs(), "Initializing in-memory event buffer");
                Ok(Self {
                    inner: Arc::new(crate::memory::MemoryEventBuffer::new(ttl)),
                    backend: "memory",
                })
            }
            other => Err(AppError::configuration(format!(
                "Unknown buffer provider: '{other}'. Supported: memory, redis"
            ))),
        }
    }

    /// Wrap an existing buffer (for testing).
    pub fn from_buffer(buffer: Arc<dyn EventBuffer>) -> Self {
        Self {
            inner: buffer,
            backend: "custom",
        }
    }

    /// Name of the active backend.
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

#[async_trait]
impl EventBuffer for BufferManager {
    async fn append(&self, event: &Event) -> AppResult<()> {
        self.inner.append(event).await
    }

    async fn read_for_user(&self, user: UserId) -> AppResult<Vec<Event>> {
        self.inner.read_for_user(user).await
    }

    async fn clear_for_user(&self, user: UserId) -> AppResult<u64> {
        self.inner.clear_for_user(user).await
    }

    async fn remove_for_user(&self, user: UserId, id: EventId) -> AppResult<bool> {
        self.inner.remove_for_user(user, id).await
    }

    async fn peek_batch(&self, limit: usize) -> AppResult<Vec<Event>> {
        self.inner.peek_batch(limit).await
    }

    async fn remove(&self, events: &[Event]) -> AppResult<u64> {
        self.inner.remove(events).await
    }

    async fn len(&self) -> AppResult<u64> {
        self.inner.len().await
    }

    async fn ping(&self) -> AppResult<bool> {
        self.inner.ping().await
    }
}
