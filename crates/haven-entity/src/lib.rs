//! # haven-entity
//!
//! Domain entity models for the Haven property-management platform:
//! users, organizations, role assignments and the permission catalog,
//! invitations, persisted tokens, and the resource records access
//! decisions are scoped to.

pub mod invitation;
pub mod membership;
pub mod organization;
pub mod resource;
pub mod token;
pub mod user;

pub use invitation::{Invitation, InvitationStatus};
pub use membership::{Permission, PermissionOverrides, PermissionSet, Role, RoleAssignment, RoleScope};
pub use organization::Organization;
pub use resource::{
    Invoice, Lease, MaintenanceRequest, Property, ResourceFacts, ResourceKind, ResourceRef, Unit,
};
pub use token::{PasswordResetToken, RefreshTokenRecord};
pub use user::User;
