//! Resolves the effective permission set of one role assignment.
//!
//! Resolution order is fixed: role defaults, then the assignment's sparse
//! overrides, then the scope restriction. The restriction runs last so an
//! override can never grant a permission the assignment's context forbids.

use std::sync::Arc;

use haven_entity::{Permission, PermissionSet, RoleAssignment, RoleScope};

use super::catalog::RoleCatalog;

/// Permissions that only make sense at property scope or wider. An
/// assignment confined to a single unit never holds these.
const PROPERTY_MANAGEMENT_PERMISSIONS: [Permission; 5] = [
    Permission::ManageProperties,
    Permission::ManageUnits,
    Permission::ManageLeases,
    Permission::ManageInvoices,
    Permission::ManageMaintenance,
];

/// Computes effective permissions from a role assignment.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    catalog: Arc<RoleCatalog>,
}

impl PermissionResolver {
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        Self { catalog }
    }

    /// The catalog this resolver consults.
    pub fn catalog(&self) -> &Arc<RoleCatalog> {
        &self.catalog
    }

    /// Resolves the assignment's effective permission set.
    pub fn resolve(&self, assignment: &RoleAssignment) -> PermissionSet {
        let mut set = self.catalog.defaults(assignment.role);

        for (&permission, &granted) in &assignment.permission_overrides {
            set.set(permission, granted);
        }

        match assignment.scope_context() {
            RoleScope::Unit => {
                for permission in PROPERTY_MANAGEMENT_PERMISSIONS {
                    set.set(permission, false);
                }
                set.set(Permission::ManageOrganization, false);
            }
            RoleScope::Property => {
                set.set(Permission::ManageOrganization, false);
            }
            RoleScope::Organization | RoleScope::Global => {}
        }

        set
    }
}
