//! Typed identifiers for every entity Haven persists or references.
//!
//! Each identifier is a [`uuid::Uuid`] behind its own newtype, so an
//! `AssignmentId` cannot stand in for a `UserId` at a call site. With the
//! `sqlx` feature enabled the types bind and decode as PostgreSQL UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_ids {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// A fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The wrapped UUID.
            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    )+};
}

define_ids! {
    /// A user account.
    UserId,
    /// An organization, the tenant boundary of the platform.
    OrganizationId,
    /// A property managed by an organization.
    PropertyId,
    /// A rentable unit within a property.
    UnitId,
    /// A role assignment (a user's seat in an organization).
    AssignmentId,
    /// An invitation into an organization.
    InvitationId,
    /// A persisted refresh token record.
    TokenId,
    /// A password reset token record.
    ResetTokenId,
    /// A lease binding a tenant to a unit.
    LeaseId,
    /// An invoice issued to a user.
    InvoiceId,
    /// A maintenance request on a property.
    MaintenanceRequestId,
}
