//! Outbound email seam.

use async_trait::async_trait;

use crate::result::AppResult;

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Delivers email. Implementations decide the transport.
///
/// Callers distinguish best-effort sends (invitation emails, where a
/// delivery failure is logged and swallowed) from required sends (password
/// reset emails, where the failure propagates to the caller).
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a single message.
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}
