//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Buffer reconciliation worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the sweep scheduler is started.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression (with seconds) for the sweep.
    #[serde(default = "default_sweep_schedule")]
    pub sweep_schedule: String,
    /// Maximum number of buffered events moved per tick.
    #[serde(default = "default_batch_size")]
    pub sweep_batch_size: usize,
    /// Upper bound on one tick's store calls, in seconds.
    #[serde(default = "default_tick_timeout")]
    pub sweep_timeout_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_schedule: default_sweep_schedule(),
            sweep_batch_size: default_batch_size(),
            sweep_timeout_seconds: default_tick_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_schedule() -> String {
    "*/30 * * * * *".to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_tick_timeout() -> u64 {
    20
}
