//! JWT claims payload embedded in every access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use haven_core::error::AppError;
use haven_core::result::AppResult;
use haven_core::types::UserId;
use haven_entity::Role;

/// Claims carried by an access token.
///
/// Refresh tokens are opaque and persisted server-side; only access tokens
/// are JWTs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user ID.
    pub sub: String,
    /// The user's email at issuance.
    pub email: String,
    /// The user's highest-level role at issuance.
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issuer, validated on decode.
    pub iss: String,
    /// Audience, validated on decode.
    pub aud: String,
}

impl AccessClaims {
    /// Parses the subject claim into a typed user ID.
    pub fn user_id(&self) -> AppResult<UserId> {
        self.sub
            .parse()
            .map_err(|_| AppError::invalid_token("Malformed token subject"))
    }

    /// The expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}
