//! The user record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use haven_core::types::UserId;

/// A registered person, independent of any organization membership.
///
/// What a user may *do* is never stored here; that is derived from their
/// role assignments. This record only carries identity and credential
/// state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Primary key.
    pub id: UserId,
    /// Login email, stored lowercase, unique platform-wide.
    pub email: String,
    /// Argon2id password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone number (optional).
    pub phone: Option<String>,
    /// Deactivated accounts cannot authenticate or refresh.
    pub is_active: bool,
    /// Whether the login email has been confirmed.
    pub email_verified: bool,
    /// Consecutive failed logins since the last success.
    pub failed_login_attempts: i32,
    /// Login is refused until this instant when set.
    pub locked_until: Option<DateTime<Utc>>,
    /// Instant of the last successful login.
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the account is locked out at the given instant.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(locked_until) => now < locked_until,
            None => false,
        }
    }

    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
