//! Dependency probes reported by the detailed health endpoint.

use std::sync::Arc;

use async_trait::async_trait;

use quikchat_core::traits::EventBuffer;
use quikchat_database::DatabasePool;

/// A backing service whose reachability is worth reporting.
#[async_trait]
pub trait HealthProbe: Send + Sync + 'static {
    /// Short name used as the key in the health report.
    fn name(&self) -> &'static str;

    /// Whether the dependency answered.
    async fn check(&self) -> bool;
}

/// Probes the PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct DatabaseProbe(pub DatabasePool);

#[async_trait]
impl HealthProbe for DatabaseProbe {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> bool {
        self.0.ping().await.unwrap_or(false)
    }
}

/// Probes the event buffer backend.
#[derive(Clone)]
pub struct BufferProbe(pub Arc<dyn EventBuffer>);

#[async_trait]
impl HealthProbe for BufferProbe {
    fn name(&self) -> &'static str {
        "buffer"
    }

    async fn check(&self) -> bool {
        self.0.ping().await.unwrap_or(false)
    }
}
