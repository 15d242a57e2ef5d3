//! Credential, token, and lockout settings.

use serde::{Deserialize, Serialize};

/// Settings for password handling, JWT signing, and login lockout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing key for access tokens.
    #[serde(default = "defaults::jwt_secret")]
    pub jwt_secret: String,
    /// `iss` claim written into and required from every access token.
    #[serde(default = "defaults::jwt_issuer")]
    pub jwt_issuer: String,
    /// `aud` claim written into and required from every access token.
    #[serde(default = "defaults::jwt_audience")]
    pub jwt_audience: String,
    /// Minutes an access token stays valid.
    #[serde(default = "defaults::access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    /// Days a refresh token stays valid.
    #[serde(default = "defaults::refresh_ttl_days")]
    pub refresh_ttl_days: i64,
    /// Shortest password the policy accepts.
    #[serde(default = "defaults::password_min_length")]
    pub password_min_length: usize,
    /// Consecutive failed logins that trigger a lockout.
    #[serde(default = "defaults::max_failed_attempts")]
    pub max_failed_attempts: i32,
    /// Minutes a locked account stays locked.
    #[serde(default = "defaults::lockout_duration_minutes")]
    pub lockout_duration_minutes: i64,
    /// Minutes a password reset token stays valid.
    #[serde(default = "defaults::reset_token_ttl_minutes")]
    pub reset_token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: defaults::jwt_secret(),
            jwt_issuer: defaults::jwt_issuer(),
            jwt_audience: defaults::jwt_audience(),
            access_ttl_minutes: defaults::access_ttl_minutes(),
            refresh_ttl_days: defaults::refresh_ttl_days(),
            password_min_length: defaults::password_min_length(),
            max_failed_attempts: defaults::max_failed_attempts(),
            lockout_duration_minutes: defaults::lockout_duration_minutes(),
            reset_token_ttl_minutes: defaults::reset_token_ttl_minutes(),
        }
    }
}

mod defaults {
    pub fn jwt_secret() -> String {
        "CHANGE_ME_IN_PRODUCTION".to_string()
    }

    pub fn jwt_issuer() -> String {
        "haven-platform".to_string()
    }

    pub fn jwt_audience() -> String {
        "haven-api".to_string()
    }

    pub fn access_ttl_minutes() -> i64 {
        15
    }

    pub fn refresh_ttl_days() -> i64 {
        30
    }

    pub fn password_min_length() -> usize {
        8
    }

    pub fn max_failed_attempts() -> i32 {
        5
    }

    pub fn lockout_duration_minutes() -> i64 {
        15
    }

    pub fn reset_token_ttl_minutes() -> i64 {
        60
    }
}
