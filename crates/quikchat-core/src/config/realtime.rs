//! Real-time delivery engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound frame queue.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue_capacity: usize,
    /// Capacity of the hub's command channel.
    #[serde(default = "default_command_channel")]
    pub command_channel_capacity: usize,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Grace period after a missed pong, in seconds.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
    /// Maximum message content length in characters, after trimming.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
    /// Maximum inbound frame size in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Undelivered events replayed right after a connection registers.
    /// Zero disables replay.
    #[serde(default = "default_replay_limit")]
    pub replay_limit: usize,
    /// Notification fan-out settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl RealtimeConfig {
    /// Ping interval as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_seconds)
    }

    /// Maximum silence tolerated before a peer is considered dead.
    pub fn liveness_window(&self) -> Duration {
        Duration::from_secs(self.ping_interval_seconds + self.ping_timeout_seconds)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: default_outbound_queue(),
            command_channel_capacity: default_command_channel(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
            max_content_length: default_max_content_length(),
            max_frame_bytes: default_max_frame_bytes(),
            replay_limit: default_replay_limit(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// Bounded work queue for friend and group notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Number of worker tasks draining the queue.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Queue capacity; submissions wait when it is full.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_outbound_queue() -> usize {
    256
}

fn default_command_channel() -> usize {
    1024
}

fn default_ping_interval() -> u64 {
    30
}

fn default_ping_timeout() -> u64 {
    10
}

fn default_max_content_length() -> usize {
    200
}

fn default_max_frame_bytes() -> usize {
    64 * 1024
}

fn default_replay_limit() -> usize {
    100
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}
