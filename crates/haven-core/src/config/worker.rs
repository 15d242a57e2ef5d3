//! Background worker settings.

use serde::{Deserialize, Serialize};

/// Settings for the scheduled cleanup jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker runs at all.
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
    /// Cron expression for the expired-invitation sweep.
    #[serde(default = "defaults::invitation_sweep_schedule")]
    pub invitation_sweep_schedule: String,
    /// Cron expression for the dead refresh/reset token purge.
    #[serde(default = "defaults::token_purge_schedule")]
    pub token_purge_schedule: String,
    /// Days to retain expired or revoked tokens before purging.
    #[serde(default = "defaults::token_retention_days")]
    pub token_retention_days: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            invitation_sweep_schedule: defaults::invitation_sweep_schedule(),
            token_purge_schedule: defaults::token_purge_schedule(),
            token_retention_days: defaults::token_retention_days(),
        }
    }
}

mod defaults {
    pub fn enabled() -> bool {
        true
    }

    // Top of every hour.
    pub fn invitation_sweep_schedule() -> String {
        "0 0 * * * *".to_string()
    }

    // Daily at 03:30.
    pub fn token_purge_schedule() -> String {
        "0 30 3 * * *".to_string()
    }

    pub fn token_retention_days() -> i64 {
        30
    }
}
