//! Ping/pong heartbeat for WebSocket keepalive.

use std::time::Duration;

use quikchat_core::config::realtime::RealtimeConfig;

use super::handle::ClientHandle;

/// Heartbeat configuration
#[derive(Debug, Clone, Copy)]
pub struct Heartbeat {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Silence after which the peer is considered dead
    pub liveness_window: Duration,
}

impl Heartbeat {
    /// Build from engine configuration. A zero interval is raised to one
    /// second.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        let ping_interval = config.ping_interval().max(Duration::from_secs(1));
        Self {
            ping_interval,
            liveness_window: config.liveness_window().max(ping_interval),
        }
    }

    /// Whether the peer has been silent longer than the liveness window.
    pub fn is_expired(&self, handle: &ClientHandle) -> bool {
        handle.idle_for() > self.liveness_window
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = RealtimeConfig {
            ping_interval_seconds: 0,
            ping_timeout_seconds: 0,
            ..RealtimeConfig::default()
        };
        let hb = Heartbeat::from_config(&config);
        assert_eq!(hb.ping_interval, Duration::from_secs(1));
        assert_eq!(hb.liveness_window, Duration::from_secs(1));
    }

    #[test]
    fn test_default_window() {
        let hb = Heartbeat::default();
        assert_eq!(hb.ping_interval, Duration::from_secs(30));
        assert_eq!(hb.liveness_window, Duration::from_secs(40));
    }
}
