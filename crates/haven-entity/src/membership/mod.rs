//! Membership domain entities: roles, the permission catalog, and
//! per-organization role assignments.

pub mod assignment;
pub mod permission;
pub mod role;

pub use assignment::RoleAssignment;
pub use permission::{Permission, PermissionOverrides, PermissionSet};
pub use role::{Role, RoleScope};
