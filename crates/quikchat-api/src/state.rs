//! Shared application state passed to all handlers via Axum's `State` extractor.

use std::sync::Arc;
use std::time::Instant;

use quikchat_core::traits::Authenticator;
use quikchat_realtime::RealtimeEngine;
use quikchat_service::EventService;

use crate::probe::HealthProbe;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Bearer token verification.
    pub authenticator: Arc<dyn Authenticator>,
    /// Buffer plus durable store, for catch-up reads and acks.
    pub events: EventService,
    /// Real-time engine.
    pub realtime: RealtimeEngine,
    /// Dependencies reported by the detailed health check.
    pub probes: Arc<Vec<Arc<dyn HealthProbe>>>,
    /// Process start, for uptime.
    pub started_at: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}

impl AppState {
    /// Creates the state; the clock for uptime starts now.
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        events: EventService,
        realtime: RealtimeEngine,
        probes: Vec<Arc<dyn HealthProbe>>,
    ) -> Self {
        Self {
            authenticator,
            events,
            realtime,
            probes: Arc::new(probes),
            started_at: Instant::now(),
        }
    }
}
