//! Log output settings.

use serde::{Deserialize, Serialize};

/// Controls the verbosity and shape of log output.
///
/// A `RUST_LOG` value in the environment takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter, e.g. `"info"` or `"haven=debug,sqlx=warn"`.
    #[serde(default = "defaults::level")]
    pub level: String,
    /// Output shape: `"json"` for machines, `"pretty"` for humans.
    #[serde(default = "defaults::format")]
    pub format: String,
}

impl LoggingConfig {
    /// True when human-readable output was requested; anything else is JSON.
    pub fn is_pretty(&self) -> bool {
        self.format.eq_ignore_ascii_case("pretty")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
            format: defaults::format(),
        }
    }
}

mod defaults {
    pub fn level() -> String {
        "info".to_string()
    }

    pub fn format() -> String {
        "json".to_string()
    }
}
