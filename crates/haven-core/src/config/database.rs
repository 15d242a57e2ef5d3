//! Connection pool settings for PostgreSQL.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the PostgreSQL connection pool.
///
/// Only `url` is required; sizing and timeout fields fall back to values
/// suitable for a single-node deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL, including credentials and database name.
    pub url: String,
    /// Upper bound on pooled connections.
    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,
    /// Connections kept open even when idle.
    #[serde(default = "defaults::min_connections")]
    pub min_connections: u32,
    /// Seconds to wait when acquiring a connection.
    #[serde(default = "defaults::connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
    /// Seconds an idle connection may live before the pool closes it.
    #[serde(default = "defaults::idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Acquire timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Idle timeout as a [`Duration`].
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}

mod defaults {
    pub fn max_connections() -> u32 {
        20
    }

    pub fn min_connections() -> u32 {
        5
    }

    pub fn connect_timeout_seconds() -> u64 {
        10
    }

    pub fn idle_timeout_seconds() -> u64 {
        600
    }
}
