//! Cache and event buffer configuration.

use serde::{Deserialize, Serialize};

/// Top-level cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Buffer backend: `"memory"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Redis-specific configuration.
    #[serde(default)]
    pub redis: RedisCacheConfig,
    /// Event buffer retention settings.
    #[serde(default)]
    pub buffer: BufferConfig,
    /// In-process profile cache settings.
    #[serde(default)]
    pub profiles: ProfileCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            redis: RedisCacheConfig::default(),
            buffer: BufferConfig::default(),
            profiles: ProfileCacheConfig::default(),
        }
    }
}

/// Redis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all QuikChat keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// Retention of buffered events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// How long an event may sit in the buffer, anchored at its `createdAt`.
    #[serde(default = "default_buffer_ttl")]
    pub ttl_seconds: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_buffer_ttl(),
        }
    }
}

/// Profile projection cache used for payload enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCacheConfig {
    /// Maximum number of cached profiles.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// TTL for cached profiles in seconds.
    #[serde(default = "default_profile_ttl")]
    pub time_to_live_seconds: u64,
}

impl Default for ProfileCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            time_to_live_seconds: default_profile_ttl(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "quikchat:".to_string()
}

fn default_buffer_ttl() -> u64 {
    48 * 60 * 60
}

fn default_max_capacity() -> u64 {
    10000
}

fn default_profile_ttl() -> u64 {
    300
}
