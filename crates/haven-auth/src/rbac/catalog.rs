//! The immutable role catalog: privilege levels, default scopes, and the
//! default permission set granted by each role.
//!
//! The catalog is built once at startup and injected wherever role
//! semantics are needed. Nothing in the platform consults a global.

use std::collections::HashMap;

use haven_entity::{Permission, PermissionSet, Role, RoleScope};

/// Maps each role to its privilege level, default scope, and default
/// permission grants.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    defaults: HashMap<Role, PermissionSet>,
}

impl RoleCatalog {
    /// Builds the standard six-role catalog.
    pub fn standard() -> Self {
        let mut defaults = HashMap::new();

        defaults.insert(
            Role::Tenant,
            PermissionSet::none().grant(&[
                Permission::ViewOwnLease,
                Permission::PayInvoices,
                Permission::CreateMaintenanceRequests,
            ]),
        );

        defaults.insert(
            Role::Caretaker,
            PermissionSet::none().grant(&[
                Permission::ViewProperties,
                Permission::ManageMaintenance,
                Permission::CreateMaintenanceRequests,
            ]),
        );

        defaults.insert(
            Role::Manager,
            PermissionSet::none().grant(&[
                Permission::ViewProperties,
                Permission::ManageMaintenance,
                Permission::CreateMaintenanceRequests,
                Permission::ViewLeases,
                Permission::ViewInvoices,
                Permission::ManageUnits,
                Permission::ManageLeases,
                Permission::ManageInvoices,
                Permission::AssignCaretakers,
                Permission::InviteUsers,
                Permission::ViewReports,
            ]),
        );

        defaults.insert(
            Role::PropertyOwner,
            PermissionSet::none().grant(&[
                Permission::ViewProperties,
                Permission::ManageMaintenance,
                Permission::CreateMaintenanceRequests,
                Permission::ViewLeases,
                Permission::ViewInvoices,
                Permission::ManageUnits,
                Permission::ManageLeases,
                Permission::ManageInvoices,
                Permission::AssignCaretakers,
                Permission::InviteUsers,
                Permission::ViewReports,
                Permission::ManageProperties,
                Permission::RemoveUsers,
                Permission::ManageRoles,
                Permission::ExportData,
            ]),
        );

        defaults.insert(Role::Admin, PermissionSet::all());
        defaults.insert(Role::SuperAdmin, PermissionSet::all());

        Self { defaults }
    }

    /// The privilege level of a role; higher outranks lower.
    pub fn level(&self, role: Role) -> u8 {
        role.privilege_level()
    }

    /// The scope a role operates at when its assignment carries no
    /// narrower context.
    pub fn default_scope(&self, role: Role) -> RoleScope {
        match role {
            Role::Tenant => RoleScope::Unit,
            Role::Caretaker | Role::Manager => RoleScope::Property,
            Role::PropertyOwner | Role::Admin => RoleScope::Organization,
            Role::SuperAdmin => RoleScope::Global,
        }
    }

    /// The default permission grants of a role. Unknown roles cannot occur
    /// with the closed enum, but an absent entry denies everything.
    pub fn defaults(&self, role: Role) -> PermissionSet {
        self.defaults
            .get(&role)
            .copied()
            .unwrap_or_else(PermissionSet::none)
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_has_a_defaults_entry() {
        let catalog = RoleCatalog::standard();
        for role in Role::ALL {
            assert!(
                !catalog.defaults(role).granted().is_empty(),
                "role {role} has no default grants"
            );
        }
    }

    #[test]
    fn levels_strictly_increase_with_seniority() {
        let catalog = RoleCatalog::standard();
        let levels: Vec<u8> = Role::ALL.iter().map(|r| catalog.level(*r)).collect();
        assert!(levels.windows(2).all(|w| w[0] < w[1]), "levels: {levels:?}");
        assert_eq!(catalog.level(Role::Tenant), 50);
        assert_eq!(catalog.level(Role::SuperAdmin), 100);
    }

    #[test]
    fn default_scopes_widen_with_seniority() {
        let catalog = RoleCatalog::standard();
        assert_eq!(catalog.default_scope(Role::Tenant), RoleScope::Unit);
        assert_eq!(catalog.default_scope(Role::Caretaker), RoleScope::Property);
        assert_eq!(catalog.default_scope(Role::Manager), RoleScope::Property);
        assert_eq!(
            catalog.default_scope(Role::PropertyOwner),
            RoleScope::Organization
        );
        assert_eq!(catalog.default_scope(Role::Admin), RoleScope::Organization);
        assert_eq!(catalog.default_scope(Role::SuperAdmin), RoleScope::Global);
    }

    #[test]
    fn seniors_hold_a_superset_of_manager_grants() {
        let catalog = RoleCatalog::standard();
        let manager = catalog.defaults(Role::Manager);
        for senior in [Role::PropertyOwner, Role::Admin, Role::SuperAdmin] {
            let senior_set = catalog.defaults(senior);
            for permission in manager.granted() {
                assert!(
                    senior_set.is_granted(permission),
                    "{senior} lost manager grant {permission}"
                );
            }
        }
    }

    #[test]
    fn tenant_cannot_manage_anything() {
        let catalog = RoleCatalog::standard();
        let tenant = catalog.defaults(Role::Tenant);
        assert!(tenant.is_granted(Permission::ViewOwnLease));
        assert!(tenant.is_granted(Permission::PayInvoices));
        assert!(!tenant.is_granted(Permission::ManageLeases));
        assert!(!tenant.is_granted(Permission::ManageOrganization));
        assert!(!tenant.is_granted(Permission::InviteUsers));
    }
}
