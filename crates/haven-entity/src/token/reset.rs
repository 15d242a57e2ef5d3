//! Password reset token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use haven_core::types::{ResetTokenId, UserId};

/// A single-use, short-lived password reset token.
///
/// Stored hashed, like refresh tokens. Consuming the token stamps
/// `used_at`; a consumed or expired token can never reset a password.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PasswordResetToken {
    /// Unique reset token identifier.
    pub id: ResetTokenId,
    /// The user whose password may be reset.
    pub user_id: UserId,
    /// SHA-256 digest of the opaque token, base64url-encoded.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// When the token was consumed (if it was).
    pub used_at: Option<DateTime<Utc>>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Check whether the token has expired at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check whether the token can still be consumed at the given instant.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && !self.is_expired(now)
    }
}
