//! The authenticated caller.
//!
//! A `Principal` is assembled once per request by the gate and passed
//! explicitly to services and guards. Nothing reads caller identity from
//! ambient state.

use haven_core::types::{OrganizationId, PropertyId, UserId};
use haven_entity::{Permission, PermissionSet, Role, RoleAssignment, User};

/// One role assignment together with its resolved permission set.
#[derive(Debug, Clone)]
pub struct Membership {
    /// The underlying assignment row.
    pub assignment: RoleAssignment,
    /// Effective permissions after overrides and scope restriction.
    pub permissions: PermissionSet,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Principal {
    /// The authenticated user.
    pub user_id: UserId,
    /// The user's email.
    pub email: String,
    /// Every role assignment the user holds, with resolved permissions.
    pub memberships: Vec<Membership>,
    /// Permissions of the primary assignment (else the highest-level one).
    pub permissions: PermissionSet,
    /// Organization of the primary assignment, when the user has one.
    pub organization_id: Option<OrganizationId>,
    /// Device identifier the client sent with this request.
    pub device_id: Option<String>,
}

impl Principal {
    /// Assembles a principal from the user and their memberships.
    ///
    /// The request-time default permission set comes from the primary
    /// assignment; a user without a primary falls back to their
    /// highest-level assignment, and a user with no assignments at all
    /// gets an empty set.
    pub fn assemble(user: &User, memberships: Vec<Membership>, device_id: Option<String>) -> Self {
        let primary = memberships
            .iter()
            .find(|m| m.assignment.is_primary)
            .or_else(|| {
                memberships
                    .iter()
                    .max_by_key(|m| m.assignment.role.privilege_level())
            });

        let (permissions, organization_id) = match primary {
            Some(m) => (m.permissions, Some(m.assignment.organization_id)),
            None => (PermissionSet::none(), None),
        };

        Self {
            user_id: user.id,
            email: user.email.clone(),
            memberships,
            permissions,
            organization_id,
            device_id,
        }
    }

    /// Whether the default permission set grants `permission`.
    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.is_granted(permission)
    }

    /// Whether any assignment within `organization_id` grants `permission`.
    pub fn can_in_org(&self, organization_id: OrganizationId, permission: Permission) -> bool {
        self.memberships.iter().any(|m| {
            m.assignment.organization_id == organization_id
                && m.permissions.is_granted(permission)
        })
    }

    /// Whether the principal holds any of the listed roles, in any
    /// organization.
    pub fn holds_any_role(&self, roles: &[Role]) -> bool {
        self.memberships
            .iter()
            .any(|m| roles.contains(&m.assignment.role))
    }

    /// The principal's highest-level role across all assignments.
    pub fn highest_role(&self) -> Option<Role> {
        self.memberships
            .iter()
            .map(|m| m.assignment.role)
            .max_by_key(|r| r.privilege_level())
    }

    /// The highest privilege level the principal holds within one
    /// organization.
    pub fn highest_level_in_org(&self, organization_id: OrganizationId) -> Option<u8> {
        self.memberships
            .iter()
            .filter(|m| m.assignment.organization_id == organization_id)
            .map(|m| m.assignment.role.privilege_level())
            .max()
    }

    /// Whether the principal holds any assignment in the organization.
    pub fn is_member_of(&self, organization_id: OrganizationId) -> bool {
        self.memberships
            .iter()
            .any(|m| m.assignment.organization_id == organization_id)
    }

    /// Whether the principal manages the given property: an assignment in
    /// the organization at manager level or above that is either
    /// organization-wide or scoped to exactly that property.
    ///
    /// A resource with no property (`property_id` of `None`) is only
    /// managed by organization-wide assignments.
    pub fn manages_property(
        &self,
        organization_id: OrganizationId,
        property_id: Option<PropertyId>,
    ) -> bool {
        self.memberships.iter().any(|m| {
            let assignment = &m.assignment;
            assignment.organization_id == organization_id
                && assignment.role.is_manager_or_above()
                && match (assignment.property_id, property_id) {
                    (None, _) => true,
                    (Some(own), Some(target)) => own == target,
                    (Some(_), None) => false,
                }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use haven_core::types::AssignmentId;
    use haven_entity::PermissionOverrides;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: "principal@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Pri".to_string(),
            last_name: "Ncipal".to_string(),
            phone: None,
            is_active: true,
            email_verified: true,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn membership(
        user_id: UserId,
        organization_id: OrganizationId,
        role: Role,
        is_primary: bool,
        permissions: PermissionSet,
    ) -> Membership {
        let now = Utc::now();
        Membership {
            assignment: RoleAssignment {
                id: AssignmentId::new(),
                user_id,
                organization_id,
                role,
                property_id: None,
                unit_id: None,
                permission_overrides: PermissionOverrides::new(),
                is_primary,
                created_at: now,
                updated_at: now,
            },
            permissions,
        }
    }

    #[test]
    fn default_permissions_come_from_the_primary_assignment() {
        let user = user();
        let primary_org = OrganizationId::new();
        let other_org = OrganizationId::new();

        let principal = Principal::assemble(
            &user,
            vec![
                membership(
                    user.id,
                    other_org,
                    Role::Admin,
                    false,
                    PermissionSet::all(),
                ),
                membership(
                    user.id,
                    primary_org,
                    Role::Tenant,
                    true,
                    PermissionSet::none().grant(&[Permission::ViewOwnLease]),
                ),
            ],
            None,
        );

        assert_eq!(principal.organization_id, Some(primary_org));
        assert!(principal.can(Permission::ViewOwnLease));
        // The primary is a tenant; admin powers in the other org do not leak
        // into the default set.
        assert!(!principal.can(Permission::ManageOrganization));
        assert!(principal.can_in_org(other_org, Permission::ManageOrganization));
        assert!(!principal.can_in_org(primary_org, Permission::ManageOrganization));
    }

    #[test]
    fn falls_back_to_highest_level_without_a_primary() {
        let user = user();
        let junior_org = OrganizationId::new();
        let senior_org = OrganizationId::new();

        let principal = Principal::assemble(
            &user,
            vec![
                membership(
                    user.id,
                    junior_org,
                    Role::Caretaker,
                    false,
                    PermissionSet::none().grant(&[Permission::ManageMaintenance]),
                ),
                membership(
                    user.id,
                    senior_org,
                    Role::PropertyOwner,
                    false,
                    PermissionSet::none().grant(&[Permission::ManageProperties]),
                ),
            ],
            None,
        );

        assert_eq!(principal.organization_id, Some(senior_org));
        assert!(principal.can(Permission::ManageProperties));
        assert_eq!(principal.highest_role(), Some(Role::PropertyOwner));
        assert_eq!(
            principal.highest_level_in_org(junior_org),
            Some(Role::Caretaker.privilege_level())
        );
    }

    #[test]
    fn no_memberships_means_no_permissions() {
        let user = user();
        let principal = Principal::assemble(&user, Vec::new(), None);
        assert_eq!(principal.organization_id, None);
        assert_eq!(principal.highest_role(), None);
        assert!(!principal.can(Permission::ViewOwnLease));
        assert!(!principal.is_member_of(OrganizationId::new()));
    }

    #[test]
    fn property_management_respects_assignment_scope() {
        let user = user();
        let org = OrganizationId::new();
        let managed = PropertyId::new();
        let other = PropertyId::new();

        let mut m = membership(user.id, org, Role::Manager, true, PermissionSet::none());
        m.assignment.property_id = Some(managed);
        let principal = Principal::assemble(&user, vec![m], None);

        assert!(principal.manages_property(org, Some(managed)));
        assert!(!principal.manages_property(org, Some(other)));
        // A property-scoped manager does not manage org-level resources.
        assert!(!principal.manages_property(org, None));
        assert!(!principal.manages_property(OrganizationId::new(), Some(managed)));
    }

    #[test]
    fn caretakers_never_manage_properties() {
        let user = user();
        let org = OrganizationId::new();
        let principal = Principal::assemble(
            &user,
            vec![membership(
                user.id,
                org,
                Role::Caretaker,
                true,
                PermissionSet::none(),
            )],
            None,
        );
        assert!(!principal.manages_property(org, Some(PropertyId::new())));
        assert!(!principal.manages_property(org, None));
    }
}
