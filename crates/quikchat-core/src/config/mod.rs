//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod cache;
pub mod database;
pub mod logging;
pub mod realtime;
pub mod worker;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::auth::AuthConfig;
use self::cache::CacheConfig;
use self::database::DatabaseConfig;
use self::logging::LoggingConfig;
use self::realtime::RealtimeConfig;
use self::worker::WorkerConfig;

use crate::error::AppError;

/// Environment variable prefix for overrides, e.g. `QUIKCHAT__SERVER__PORT`.
pub const ENV_PREFIX: &str = "QUIKCHAT";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (base file + environment overlay + env vars).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Cache and event buffer settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Token verification settings.
    pub auth: AuthConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Real-time delivery settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration using the default base file `config/default`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config/default", env)
    }

    /// Load configuration from `base` merged with `config/{env}` and
    /// environment variables prefixed with `QUIKCHAT__`.
    ///
    /// Both files are optional; the file extension may be omitted.
    pub fn load_from(base: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings that would make the delivery core misbehave.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if self.realtime.outbound_queue_capacity == 0 {
            return Err(AppError::configuration(
                "realtime.outbound_queue_capacity must be at least 1",
            ));
        }
        if self.realtime.max_content_length == 0 {
            return Err(AppError::configuration(
                "realtime.max_content_length must be at least 1",
            ));
        }
        if self.realtime.notifications.workers == 0 {
            return Err(AppError::configuration(
                "realtime.notifications.workers must be at least 1",
            ));
        }
        if self.worker.sweep_batch_size == 0 {
            return Err(AppError::configuration(
                "worker.sweep_batch_size must be at least 1",
            ));
        }
        match self.cache.provider.as_str() {
            "memory" | "redis" => Ok(()),
            other => Err(AppError::configuration(format!(
                "Unknown cache provider '{other}'"
            ))),
        }
    }
}
