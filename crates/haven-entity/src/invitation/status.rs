//! Invitation status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an invitation.
///
/// `Pending` is the only state from which any transition is legal; all the
/// others are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum InvitationStatus {
    /// Created and waiting for the recipient.
    Pending,
    /// The recipient joined the organization.
    Accepted,
    /// The recipient turned the invitation down.
    Declined,
    /// The inviter (or an administrator) withdrew it.
    Revoked,
    /// It sat unanswered past its expiry.
    Expired,
}

impl InvitationStatus {
    /// Return the status's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }

    /// Check whether the invitation can still change state.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvitationStatus {
    type Err = haven_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "revoked" => Ok(Self::Revoked),
            "expired" => Ok(Self::Expired),
            _ => Err(haven_core::AppError::validation(format!(
                "Invalid invitation status: '{s}'"
            ))),
        }
    }
}
