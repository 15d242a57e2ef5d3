//! Invitation entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use haven_core::types::{InvitationId, OrganizationId, PropertyId, UnitId, UserId};

use crate::membership::{PermissionOverrides, Role};

use super::status::InvitationStatus;

/// An offer to join an organization under a given role.
///
/// The opaque token is the capability: whoever presents it may accept or
/// decline. At most one *pending* invitation exists per organization and
/// email.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    /// Unique invitation identifier.
    pub id: InvitationId,
    /// The organization extending the offer.
    pub organization_id: OrganizationId,
    /// Recipient email, stored lowercase.
    pub email: String,
    /// Role granted on acceptance.
    pub role: Role,
    /// Narrows the future assignment to one property.
    pub property_id: Option<PropertyId>,
    /// Narrows the future assignment to one unit.
    pub unit_id: Option<UnitId>,
    /// Permission overrides carried into the future assignment.
    #[sqlx(json)]
    pub permission_overrides: PermissionOverrides,
    /// The member who extended the offer.
    pub invited_by: UserId,
    /// Opaque acceptance token, unique platform-wide.
    pub token: String,
    /// Lifecycle state.
    pub status: InvitationStatus,
    /// When the offer lapses.
    pub expires_at: DateTime<Utc>,
    /// When the offer was accepted (if it was).
    pub accepted_at: Option<DateTime<Utc>>,
    /// When the invitation was created.
    pub created_at: DateTime<Utc>,
    /// When the invitation was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    /// Check whether the offer has lapsed at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check whether the offer can be accepted at the given instant.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status.is_pending() && !self.is_expired(now)
    }
}
