//! HTTP server and CORS settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bind address and shutdown behavior of the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "defaults::host")]
    pub host: String,
    /// Port to bind.
    #[serde(default = "defaults::port")]
    pub port: u16,
    /// Seconds to wait for in-flight requests during shutdown.
    #[serde(default = "defaults::shutdown_grace_seconds")]
    pub shutdown_grace_seconds: u64,
    /// Cross-origin request settings.
    #[serde(default)]
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            shutdown_grace_seconds: defaults::shutdown_grace_seconds(),
            cors: CorsConfig::default(),
        }
    }
}

/// Cross-origin request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API; `["*"]` opens it to everyone.
    #[serde(default = "defaults::allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Seconds a preflight response may be cached.
    #[serde(default = "defaults::max_age_seconds")]
    pub max_age_seconds: u64,
}

impl CorsConfig {
    /// True when the wildcard origin is configured.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }

    /// Preflight cache lifetime as a [`Duration`].
    pub fn preflight_max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: defaults::allowed_origins(),
            max_age_seconds: defaults::max_age_seconds(),
        }
    }
}

mod defaults {
    pub fn host() -> String {
        "0.0.0.0".to_string()
    }

    pub fn port() -> u16 {
        8080
    }

    pub fn shutdown_grace_seconds() -> u64 {
        30
    }

    pub fn allowed_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    pub fn max_age_seconds() -> u64 {
        3600
    }
}
