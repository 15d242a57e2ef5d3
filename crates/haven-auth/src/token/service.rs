//! Refresh token issuance, rotation, and revocation.
//!
//! Refresh tokens are opaque: 32 random bytes handed to the client once,
//! stored only as a SHA-256 digest. Each rotation revokes the old record
//! and inserts a successor carrying the same family id; presenting an
//! already-rotated token burns the entire family.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use haven_core::config::AuthConfig;
use haven_core::error::AppError;
use haven_core::result::AppResult;
use haven_core::traits::Clock;
use haven_core::types::{TokenId, UserId};
use haven_entity::{RefreshTokenRecord, Role, User};
use haven_store::Store;

use super::claims::AccessClaims;
use super::codec::JwtCodec;

/// Generates an opaque token: 32 CSPRNG bytes, base64url without padding.
pub fn opaque_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The digest form an opaque token is stored under.
pub fn token_digest(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Client device details captured alongside a refresh token.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Stable client-chosen device identifier, when supplied.
    pub device_id: Option<String>,
    /// The User-Agent header of the issuing request.
    pub user_agent: Option<String>,
    /// The remote address of the issuing request.
    pub ip_address: Option<String>,
}

/// A freshly issued access + refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived signed access token.
    pub access_token: String,
    /// When the access token expires.
    pub access_expires_at: DateTime<Utc>,
    /// Opaque refresh token; shown to the client exactly once.
    pub refresh_token: String,
}

/// Issues, rotates, and revokes tokens.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn Store>,
    codec: JwtCodec,
    clock: Arc<dyn Clock>,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(
        store: Arc<dyn Store>,
        codec: JwtCodec,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            store,
            codec,
            clock,
            refresh_ttl: Duration::days(config.refresh_ttl_days),
        }
    }

    /// Issues a full access + refresh pair, starting a new token family.
    pub async fn issue_pair(
        &self,
        user: &User,
        role: Role,
        device: &DeviceInfo,
    ) -> AppResult<TokenPair> {
        let now = self.clock.now();
        let (access_token, access_expires_at) = self.codec.issue(user, role, now)?;

        let (refresh_token, record) = self.build_refresh_record(user.id, Uuid::new_v4(), device, now);
        self.store.insert_refresh_token(&record).await?;

        Ok(TokenPair {
            access_token,
            access_expires_at,
            refresh_token,
        })
    }

    /// Issues a standalone access token (after a successful refresh).
    pub fn issue_access(&self, user: &User, role: Role) -> AppResult<(String, DateTime<Utc>)> {
        self.codec.issue(user, role, self.clock.now())
    }

    /// Decodes and validates an access token.
    pub fn decode_access(&self, token: &str) -> AppResult<AccessClaims> {
        self.codec.decode(token)
    }

    /// Rotates a refresh token: the presented token is revoked and a
    /// successor in the same family is returned along with the owning user.
    ///
    /// Presenting an expired, unknown, revoked, or wrong-device token fails
    /// with `InvalidOrExpiredToken`; the revoked case additionally burns
    /// the whole family, since a replayed token means the raw value leaked.
    pub async fn rotate(&self, raw: &str, device: &DeviceInfo) -> AppResult<(String, UserId)> {
        let now = self.clock.now();
        let record = self
            .store
            .find_refresh_token_by_hash(&token_digest(raw))
            .await?
            .ok_or_else(|| AppError::invalid_token("Refresh token not recognized"))?;

        if record.is_expired(now) {
            return Err(AppError::invalid_token("Refresh token has expired"));
        }

        if record.is_revoked {
            let burned = self.store.revoke_token_family(record.family_id, now).await?;
            tracing::warn!(
                target: "audit",
                user_id = %record.user_id,
                family_id = %record.family_id,
                tokens_revoked = burned,
                "Refresh token reuse detected; token family revoked"
            );
            return Err(AppError::invalid_token("Refresh token has been revoked"));
        }

        if let Some(bound) = &record.device_id {
            if device.device_id.as_deref() != Some(bound.as_str()) {
                return Err(AppError::invalid_token(
                    "Refresh token is bound to a different device",
                ));
            }
        }

        let (new_raw, mut replacement) =
            self.build_refresh_record(record.user_id, record.family_id, device, now);
        // Keep the original device binding even if the rotating request
        // omitted optional metadata.
        replacement.device_id = record.device_id.clone();

        let rotated = self
            .store
            .rotate_refresh_token(record.id, now, &replacement)
            .await?;

        if !rotated {
            // Another request rotated this record first; treat the loser
            // exactly like a replay.
            let burned = self.store.revoke_token_family(record.family_id, now).await?;
            tracing::warn!(
                target: "audit",
                user_id = %record.user_id,
                family_id = %record.family_id,
                tokens_revoked = burned,
                "Concurrent refresh token rotation; token family revoked"
            );
            return Err(AppError::invalid_token("Refresh token has been revoked"));
        }

        Ok((new_raw, record.user_id))
    }

    /// Revokes the presented refresh token. Unknown or already-revoked
    /// tokens are ignored so logout stays idempotent.
    pub async fn revoke(&self, raw: &str) -> AppResult<()> {
        let now = self.clock.now();
        if let Some(record) = self
            .store
            .find_refresh_token_by_hash(&token_digest(raw))
            .await?
        {
            self.store.revoke_refresh_token(record.id, now).await?;
        }
        Ok(())
    }

    /// Revokes every token in a family.
    pub async fn revoke_family(&self, family_id: Uuid) -> AppResult<u64> {
        self.store
            .revoke_token_family(family_id, self.clock.now())
            .await
    }

    /// Revokes every token a user holds on one device.
    pub async fn revoke_device(&self, user_id: UserId, device_id: &str) -> AppResult<u64> {
        self.store
            .revoke_tokens_for_device(user_id, device_id, self.clock.now())
            .await
    }

    /// Revokes every token of a user, across all devices.
    pub async fn revoke_all_for_user(&self, user_id: UserId) -> AppResult<u64> {
        self.store
            .revoke_tokens_for_user(user_id, self.clock.now())
            .await
    }

    /// Lists the user's refresh tokens that can still authenticate.
    pub async fn list_active_sessions(&self, user_id: UserId) -> AppResult<Vec<RefreshTokenRecord>> {
        self.store
            .active_refresh_tokens(user_id, self.clock.now())
            .await
    }

    fn build_refresh_record(
        &self,
        user_id: UserId,
        family_id: Uuid,
        device: &DeviceInfo,
        now: DateTime<Utc>,
    ) -> (String, RefreshTokenRecord) {
        let raw = opaque_token();
        let record = RefreshTokenRecord {
            id: TokenId::new(),
            user_id,
            token_hash: token_digest(&raw),
            family_id,
            device_id: device.device_id.clone(),
            user_agent: device.user_agent.clone(),
            ip_address: device.ip_address.clone(),
            expires_at: now + self.refresh_ttl,
            is_revoked: false,
            revoked_at: None,
            replaced_by: None,
            last_used_at: None,
            created_at: now,
        };
        (raw, record)
    }
}
