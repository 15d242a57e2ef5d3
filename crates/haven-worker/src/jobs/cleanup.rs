//! Invitation sweep and dead-token purge.

use std::sync::Arc;

use chrono::Duration;

use haven_core::result::AppResult;
use haven_core::traits::Clock;
use haven_service::InvitationService;
use haven_store::Store;

/// Periodic maintenance against the store.
///
/// Both tasks are idempotent, so overlapping or replayed runs are
/// harmless.
#[derive(Clone)]
pub struct CleanupJob {
    invitations: InvitationService,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    token_retention: Duration,
}

impl CleanupJob {
    pub fn new(
        invitations: InvitationService,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        token_retention_days: i64,
    ) -> Self {
        Self {
            invitations,
            store,
            clock,
            token_retention: Duration::days(token_retention_days),
        }
    }

    /// Flips every pending invitation past its expiry to expired.
    pub async fn sweep_invitations(&self) -> AppResult<u64> {
        let swept = self.invitations.cleanup_expired().await?;
        if swept > 0 {
            tracing::info!(swept, "Marked lapsed invitations as expired");
        } else {
            tracing::debug!("No lapsed invitations to sweep");
        }
        Ok(swept)
    }

    /// Deletes refresh and reset tokens that have been dead longer than
    /// the retention window. Rows younger than the cutoff stay for
    /// session history and audit.
    pub async fn purge_tokens(&self) -> AppResult<u64> {
        let cutoff = self.clock.now() - self.token_retention;

        let refresh = self.store.purge_dead_refresh_tokens(cutoff).await?;
        let reset = self.store.purge_dead_reset_tokens(cutoff).await?;
        let purged = refresh + reset;

        if purged > 0 {
            tracing::info!(refresh, reset, "Purged dead tokens");
        } else {
            tracing::debug!("No dead tokens to purge");
        }
        Ok(purged)
    }
}
