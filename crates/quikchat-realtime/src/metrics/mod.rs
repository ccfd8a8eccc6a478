//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use quikchat_service::StoredIn;

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    connections_replaced: AtomicU64,
    connections_evicted: AtomicU64,
    frames_received: AtomicU64,
    frames_rejected: AtomicU64,
    events_delivered: AtomicU64,
    events_buffered: AtomicU64,
    events_persisted: AtomicU64,
    events_replayed: AtomicU64,
    notifications_dispatched: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection entering the registry
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection leaving the registry
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection displaced by a newer one for the same user
    pub fn connection_replaced(&self) {
        self.connections_replaced.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection dropped for a full outbound queue
    pub fn connection_evicted(&self) {
        self.connections_evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inbound frame
    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inbound frame dropped as malformed or invalid
    pub fn frame_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event enqueued on a live connection
    pub fn event_delivered(&self) {
        self.events_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event stored for later pickup, by where it landed
    pub fn event_stored(&self, location: StoredIn) {
        let counter = match location {
            StoredIn::Buffer => &self.events_buffered,
            StoredIn::Durable => &self.events_persisted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event replayed on connect
    pub fn event_replayed(&self) {
        self.events_replayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a processed notification job
    pub fn notification_dispatched(&self) {
        self.notifications_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        MetricsSnapshot {
            connections_opened: opened,
            connections_closed: closed,
            connections_active: opened.saturating_sub(closed),
            connections_replaced: self.connections_replaced.load(Ordering::Relaxed),
            connections_evicted: self.connections_evicted.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            events_buffered: self.events_buffered.load(Ordering::Relaxed),
            events_persisted: self.events_persisted.load(Ordering::Relaxed),
            events_replayed: self.events_replayed.load(Ordering::Relaxed),
            notifications_dispatched: self.notifications_dispatched.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections ever registered
    pub connections_opened: u64,
    /// Connections removed from the registry
    pub connections_closed: u64,
    /// Currently registered connections
    pub connections_active: u64,
    /// Connections displaced by a newer one for the same user
    pub connections_replaced: u64,
    /// Connections dropped for a full outbound queue
    pub connections_evicted: u64,
    /// Inbound frames
    pub frames_received: u64,
    /// Inbound frames dropped
    pub frames_rejected: u64,
    /// Events enqueued on live connections
    pub events_delivered: u64,
    /// Events stored in the TTL buffer for later pickup
    pub events_buffered: u64,
    /// Events that fell back to the durable store
    pub events_persisted: u64,
    /// Events replayed on connect
    pub events_replayed: u64,
    /// Notification jobs processed
    pub notifications_dispatched: u64,
}
