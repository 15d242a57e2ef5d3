//! Invitation lifecycle settings.

use serde::{Deserialize, Serialize};

/// Settings for issuing and accepting invitations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Days until a pending invitation expires.
    #[serde(default = "defaults::expiry_days")]
    pub expiry_days: i64,
    /// Base URL embedded in invitation emails for the accept flow.
    #[serde(default = "defaults::accept_url_base")]
    pub accept_url_base: String,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expiry_days: defaults::expiry_days(),
            accept_url_base: defaults::accept_url_base(),
        }
    }
}

mod defaults {
    pub fn expiry_days() -> i64 {
        7
    }

    pub fn accept_url_base() -> String {
        "http://localhost:8080/invitations/accept".to_string()
    }
}
