//! Refresh token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use haven_core::types::{TokenId, UserId};

/// A persisted, opaque refresh token.
///
/// Only the SHA-256 digest of the token is stored; the raw value exists
/// solely in the response that issued it. Rotation revokes a record and
/// inserts its successor under the same `family_id`, so presenting an
/// already-revoked token identifies the whole family for revocation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshTokenRecord {
    /// Unique token identifier.
    pub id: TokenId,
    /// The user this token authenticates.
    pub user_id: UserId,
    /// SHA-256 digest of the opaque token, base64url-encoded.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Stable across rotations; links the chain back to one login.
    pub family_id: Uuid,
    /// Client-supplied device identifier the token is bound to.
    pub device_id: Option<String>,
    /// User-Agent header captured at issuance.
    pub user_agent: Option<String>,
    /// IP address captured at issuance.
    pub ip_address: Option<String>,
    /// When the token expires (absolute).
    pub expires_at: DateTime<Utc>,
    /// Whether the token has been revoked.
    pub is_revoked: bool,
    /// When the token was revoked (if it was).
    pub revoked_at: Option<DateTime<Utc>>,
    /// Successor record created when this token was rotated.
    pub replaced_by: Option<TokenId>,
    /// Last time the token was presented.
    pub last_used_at: Option<DateTime<Utc>>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Check whether the token has expired at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check whether the token can still authenticate at the given instant.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && !self.is_expired(now)
    }
}
