//! Mailer implementations.
//!
//! The platform only ever talks to the [`Mailer`] trait. `LogMailer` is
//! the default for local development and for deployments that have not
//! wired a real provider yet; `RecordingMailer` captures messages so
//! tests can assert on them.

use async_trait::async_trait;
use haven_core::error::AppError;
use haven_core::result::AppResult;
use haven_core::traits::{EmailMessage, Mailer};

/// Writes every outgoing email to the log instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        tracing::info!(to = %message.to, subject = %message.subject, "Email dispatched to log");
        tracing::debug!(body = %message.body, "Email body");
        Ok(())
    }
}

/// Captures sent messages in memory for assertions.
///
/// Flip `set_failing(true)` to make every send return an error, which is
/// how tests exercise delivery-failure paths.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<EmailMessage>>,
    failing: std::sync::atomic::AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Snapshot of everything sent so far, oldest first.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::internal("Email delivery failed"));
        }
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        Ok(())
    }
}
