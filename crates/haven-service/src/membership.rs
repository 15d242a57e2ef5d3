//! Membership management: role changes, primary selection, removal.
//!
//! Every mutating operation compares privilege levels: an actor can only
//! act on assignments strictly below their own highest role in the same
//! organization, and can never grant a role at or above their own.

use std::sync::Arc;

use haven_auth::principal::Principal;
use haven_auth::token::TokenService;
use haven_core::error::AppError;
use haven_core::result::AppResult;
use haven_core::traits::Clock;
use haven_core::types::{AssignmentId, OrganizationId};
use haven_entity::{Permission, PermissionOverrides, Role, RoleAssignment, User};
use haven_store::Store;

/// One organization member: the person plus their assignment there.
#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub user: User,
    pub assignment: RoleAssignment,
}

/// Role and membership administration within an organization.
#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    clock: Arc<dyn Clock>,
}

impl MembershipService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            tokens,
            clock,
        }
    }

    /// Every member of an organization with their assignment, oldest first.
    pub async fn members(&self, organization_id: OrganizationId) -> AppResult<Vec<MemberRecord>> {
        let assignments = self.store.assignments_for_org(organization_id).await?;
        let mut members = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            if let Some(user) = self.store.find_user(assignment.user_id).await? {
                members.push(MemberRecord { user, assignment });
            }
        }
        Ok(members)
    }

    /// Changes the role (and optionally the overrides) of an assignment.
    pub async fn change_role(
        &self,
        actor: &Principal,
        assignment_id: AssignmentId,
        new_role: Role,
        overrides: Option<PermissionOverrides>,
    ) -> AppResult<RoleAssignment> {
        let Some(mut assignment) = self.store.find_assignment(assignment_id).await? else {
            return Err(AppError::not_found("Role assignment not found"));
        };
        if assignment.user_id == actor.user_id {
            return Err(AppError::conflict(
                "You cannot change your own role assignment",
            ));
        }

        let organization_id = assignment.organization_id;
        if !actor.can_in_org(organization_id, Permission::ManageRoles) {
            return Err(AppError::insufficient_permissions(
                "You do not have permission to manage roles in this organization",
            ));
        }
        let actor_level = actor.highest_level_in_org(organization_id).unwrap_or(0);
        if assignment.role.privilege_level() >= actor_level {
            return Err(AppError::insufficient_permissions(
                "You can only change the role of members below your own role",
            ));
        }
        if new_role.privilege_level() >= actor_level {
            return Err(AppError::insufficient_permissions(
                "You cannot grant a role at or above your own",
            ));
        }
        if assignment.role.is_admin()
            && !new_role.is_admin()
            && self.store.count_org_admins(organization_id).await? <= 1
        {
            return Err(AppError::conflict(
                "An organization must retain at least one administrator",
            ));
        }

        let now = self.clock.now();
        self.store
            .update_assignment_role(assignment_id, new_role, overrides.as_ref(), now)
            .await?;

        tracing::info!(
            target: "audit",
            assignment_id = %assignment_id,
            organization_id = %organization_id,
            changed_by = %actor.user_id,
            from = %assignment.role,
            to = %new_role,
            "Member role changed"
        );

        assignment.role = new_role;
        if let Some(overrides) = overrides {
            assignment.permission_overrides = overrides;
        }
        assignment.updated_at = now;
        Ok(assignment)
    }

    /// Makes an assignment the user's primary one.
    ///
    /// Members pick their own primary; anyone with manage_roles in the
    /// assignment's organization can pick it for them.
    pub async fn set_primary(&self, actor: &Principal, assignment_id: AssignmentId) -> AppResult<()> {
        let Some(assignment) = self.store.find_assignment(assignment_id).await? else {
            return Err(AppError::not_found("Role assignment not found"));
        };
        let allowed = assignment.user_id == actor.user_id
            || actor.can_in_org(assignment.organization_id, Permission::ManageRoles);
        if !allowed {
            return Err(AppError::insufficient_permissions(
                "You cannot change another member's primary assignment",
            ));
        }

        self.store
            .set_primary_assignment(assignment.user_id, assignment_id, self.clock.now())
            .await?;

        tracing::info!(
            target: "audit",
            assignment_id = %assignment_id,
            user_id = %assignment.user_id,
            "Primary assignment changed"
        );
        Ok(())
    }

    /// Removes a member's assignment from an organization.
    ///
    /// Removing someone's last assignment anywhere also revokes all their
    /// refresh tokens; they can still log in, but carry no memberships.
    pub async fn remove_member(
        &self,
        actor: &Principal,
        assignment_id: AssignmentId,
    ) -> AppResult<()> {
        let Some(assignment) = self.store.find_assignment(assignment_id).await? else {
            return Err(AppError::not_found("Role assignment not found"));
        };

        let organization_id = assignment.organization_id;
        if !actor.can_in_org(organization_id, Permission::RemoveUsers) {
            return Err(AppError::insufficient_permissions(
                "You do not have permission to remove members from this organization",
            ));
        }
        let actor_level = actor.highest_level_in_org(organization_id).unwrap_or(0);
        if assignment.role.privilege_level() >= actor_level {
            return Err(AppError::insufficient_permissions(
                "You can only remove members below your own role",
            ));
        }
        if assignment.role.is_admin() && self.store.count_org_admins(organization_id).await? <= 1 {
            return Err(AppError::conflict(
                "An organization must retain at least one administrator",
            ));
        }

        let target = assignment.user_id;
        let held_before = self.store.assignments_for_user(target).await?;
        self.store.delete_assignment(assignment_id).await?;

        tracing::info!(
            target: "audit",
            assignment_id = %assignment_id,
            organization_id = %organization_id,
            user_id = %target,
            removed_by = %actor.user_id,
            "Member removed"
        );

        if held_before.len() <= 1 {
            let revoked = self.tokens.revoke_all_for_user(target).await?;
            tracing::info!(
                target: "audit",
                user_id = %target,
                revoked,
                "Last assignment removed; sessions revoked"
            );
        } else if assignment.is_primary {
            // The member keeps other assignments; the highest of them
            // becomes the new primary.
            let next = held_before
                .iter()
                .filter(|a| a.id != assignment_id)
                .max_by_key(|a| a.role.privilege_level());
            if let Some(next) = next {
                self.store
                    .set_primary_assignment(target, next.id, self.clock.now())
                    .await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_auth::password::PasswordHasher;
    use haven_auth::principal::Membership;
    use haven_auth::rbac::{PermissionResolver, RoleCatalog};
    use haven_auth::token::{DeviceInfo, JwtCodec};
    use haven_core::config::AuthConfig;
    use haven_core::error::ErrorKind;
    use haven_core::traits::ManualClock;
    use haven_core::types::UserId;
    use haven_entity::Organization;
    use haven_store::{
        AssignmentStore, MemoryStore, OrganizationStore, RefreshTokenStore, UserStore,
    };

    struct Harness {
        service: MembershipService,
        tokens: TokenService,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        organization_id: OrganizationId,
    }

    async fn harness() -> Harness {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let config = AuthConfig::default();
        let tokens = TokenService::new(
            store.clone(),
            JwtCodec::new(&config),
            clock.clone(),
            &config,
        );
        let service = MembershipService::new(store.clone(), tokens.clone(), clock.clone());

        let now = clock.now();
        let organization = Organization {
            id: OrganizationId::new(),
            name: "Cedar Grove Estates".to_string(),
            created_at: now,
            updated_at: now,
        };
        store.insert_organization(&organization).await.unwrap();

        Harness {
            service,
            tokens,
            store,
            clock,
            organization_id: organization.id,
        }
    }

    async fn seed_member(h: &Harness, email: &str, role: Role) -> (User, RoleAssignment) {
        let now = h.clock.now();
        let user = User {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: PasswordHasher::new()
                .hash_password("Quartz-Lantern-42")
                .unwrap(),
            first_name: "Member".to_string(),
            last_name: "Person".to_string(),
            phone: None,
            is_active: true,
            email_verified: true,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        h.store.insert_user(&user).await.unwrap();
        let assignment = seed_assignment(h, user.id, h.organization_id, role, true).await;
        (user, assignment)
    }

    async fn seed_assignment(
        h: &Harness,
        user_id: UserId,
        organization_id: OrganizationId,
        role: Role,
        is_primary: bool,
    ) -> RoleAssignment {
        let now = h.clock.now();
        let assignment = RoleAssignment {
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
        };
        h.store.insert_assignment(&assignment).await.unwrap();
        assignment
    }

    async fn principal_for(h: &Harness, user: &User) -> Principal {
        let resolver = PermissionResolver::new(Arc::new(RoleCatalog::standard()));
        let memberships: Vec<Membership> = h
            .store
            .assignments_for_user(user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|assignment| {
                let permissions = resolver.resolve(&assignment);
                Membership {
                    assignment,
                    permissions,
                }
            })
            .collect();
        Principal::assemble(user, memberships, None)
    }

    #[tokio::test]
    async fn change_role_applies_role_and_overrides() {
        let h = harness().await;
        let (admin_user, _) = seed_member(&h, "admin@example.com", Role::Admin).await;
        let (_, target) = seed_member(&h, "manager@example.com", Role::Manager).await;
        let admin = principal_for(&h, &admin_user).await;

        let mut overrides = PermissionOverrides::new();
        overrides.insert(Permission::ViewReports, true);
        let changed = h
            .service
            .change_role(&admin, target.id, Role::Caretaker, Some(overrides))
            .await
            .unwrap();
        assert_eq!(changed.role, Role::Caretaker);

        let stored = h.store.find_assignment(target.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Caretaker);
        assert_eq!(stored.permission_overrides.get(&Permission::ViewReports), Some(&true));
    }

    #[tokio::test]
    async fn cannot_change_your_own_assignment() {
        let h = harness().await;
        let (admin_user, own) = seed_member(&h, "admin@example.com", Role::Admin).await;
        let admin = principal_for(&h, &admin_user).await;

        let err = h
            .service
            .change_role(&admin, own.id, Role::Manager, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn change_role_respects_the_hierarchy() {
        let h = harness().await;
        let (owner_user, _) = seed_member(&h, "owner@example.com", Role::PropertyOwner).await;
        let (_, admin_target) = seed_member(&h, "admin@example.com", Role::Admin).await;
        let (_, manager_target) = seed_member(&h, "manager@example.com", Role::Manager).await;
        let owner = principal_for(&h, &owner_user).await;

        // A property owner cannot touch an admin's assignment.
        let err = h
            .service
            .change_role(&owner, admin_target.id, Role::Manager, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientPermissions);

        // Nor grant their own level.
        let err = h
            .service
            .change_role(&owner, manager_target.id, Role::PropertyOwner, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientPermissions);

        // Below their level in both directions is fine.
        h.service
            .change_role(&owner, manager_target.id, Role::Caretaker, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn change_role_needs_manage_roles() {
        let h = harness().await;
        let (manager_user, _) = seed_member(&h, "manager@example.com", Role::Manager).await;
        let (_, target) = seed_member(&h, "tenant@example.com", Role::Tenant).await;
        let manager = principal_for(&h, &manager_user).await;

        let err = h
            .service
            .change_role(&manager, target.id, Role::Caretaker, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientPermissions);
    }

    #[tokio::test]
    async fn members_can_pick_their_own_primary() {
        let h = harness().await;
        let (user, first) = seed_member(&h, "member@example.com", Role::Manager).await;
        let now = h.clock.now();
        let other_org = Organization {
            id: OrganizationId::new(),
            name: "Harbor Lofts".to_string(),
            created_at: now,
            updated_at: now,
        };
        h.store.insert_organization(&other_org).await.unwrap();
        let second = seed_assignment(&h, user.id, other_org.id, Role::Tenant, false).await;
        let me = principal_for(&h, &user).await;

        h.service.set_primary(&me, second.id).await.unwrap();

        let assignments = h.store.assignments_for_user(user.id).await.unwrap();
        let primary: Vec<_> = assignments.iter().filter(|a| a.is_primary).collect();
        assert_eq!(primary.len(), 1);
        assert_eq!(primary[0].id, second.id);
        assert!(!h.store.find_assignment(first.id).await.unwrap().unwrap().is_primary);
    }

    #[tokio::test]
    async fn strangers_cannot_move_someone_elses_primary() {
        let h = harness().await;
        let (_, target) = seed_member(&h, "member@example.com", Role::Tenant).await;
        let (other_user, _) = seed_member(&h, "other@example.com", Role::Tenant).await;
        let other = principal_for(&h, &other_user).await;

        let err = h.service.set_primary(&other, target.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientPermissions);
    }

    #[tokio::test]
    async fn remove_member_requires_rank_and_permission() {
        let h = harness().await;
        let (owner_user, _) = seed_member(&h, "owner@example.com", Role::PropertyOwner).await;
        let (caretaker_user, caretaker) =
            seed_member(&h, "caretaker@example.com", Role::Caretaker).await;
        let (_, admin_target) = seed_member(&h, "admin@example.com", Role::Admin).await;
        let owner = principal_for(&h, &owner_user).await;
        let caretaker_principal = principal_for(&h, &caretaker_user).await;

        // Caretakers hold no remove_users permission.
        let err = h
            .service
            .remove_member(&caretaker_principal, admin_target.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientPermissions);

        // A property owner cannot remove an admin above them.
        let err = h
            .service
            .remove_member(&owner, admin_target.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientPermissions);

        h.service.remove_member(&owner, caretaker.id).await.unwrap();
        assert!(h.store.find_assignment(caretaker.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn removing_the_last_assignment_revokes_sessions() {
        let h = harness().await;
        let (admin_user, _) = seed_member(&h, "admin@example.com", Role::Admin).await;
        let (tenant_user, tenant) = seed_member(&h, "tenant@example.com", Role::Tenant).await;
        let admin = principal_for(&h, &admin_user).await;

        h.tokens
            .issue_pair(&tenant_user, Role::Tenant, &DeviceInfo::default())
            .await
            .unwrap();

        h.service.remove_member(&admin, tenant.id).await.unwrap();

        let sessions = h
            .store
            .active_refresh_tokens(tenant_user.id, h.clock.now())
            .await
            .unwrap();
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn removing_the_primary_promotes_the_highest_remaining() {
        let h = harness().await;
        let (admin_user, _) = seed_member(&h, "admin@example.com", Role::Admin).await;
        let (member, primary) = seed_member(&h, "member@example.com", Role::Manager).await;
        let now = h.clock.now();
        let second_org = Organization {
            id: OrganizationId::new(),
            name: "Harbor Lofts".to_string(),
            created_at: now,
            updated_at: now,
        };
        let third_org = Organization {
            id: OrganizationId::new(),
            name: "Birch Row".to_string(),
            created_at: now,
            updated_at: now,
        };
        h.store.insert_organization(&second_org).await.unwrap();
        h.store.insert_organization(&third_org).await.unwrap();
        let tenant_there = seed_assignment(&h, member.id, second_org.id, Role::Tenant, false).await;
        let owner_there =
            seed_assignment(&h, member.id, third_org.id, Role::PropertyOwner, false).await;
        let admin = principal_for(&h, &admin_user).await;

        // The member keeps sessions: other assignments remain.
        h.tokens
            .issue_pair(&member, Role::Manager, &DeviceInfo::default())
            .await
            .unwrap();

        h.service.remove_member(&admin, primary.id).await.unwrap();

        let assignments = h.store.assignments_for_user(member.id).await.unwrap();
        assert_eq!(assignments.len(), 2);
        let promoted = assignments.iter().find(|a| a.is_primary).unwrap();
        assert_eq!(promoted.id, owner_there.id);
        assert!(!assignments.iter().any(|a| a.id == tenant_there.id && a.is_primary));

        let sessions = h
            .store
            .active_refresh_tokens(member.id, h.clock.now())
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn members_listing_joins_users() {
        let h = harness().await;
        seed_member(&h, "admin@example.com", Role::Admin).await;
        h.clock.advance(chrono::Duration::seconds(1));
        seed_member(&h, "tenant@example.com", Role::Tenant).await;

        let members = h.service.members(h.organization_id).await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].user.email, "admin@example.com");
        assert_eq!(members[0].assignment.role, Role::Admin);
    }

    #[tokio::test]
    async fn a_seated_super_admin_may_demote_the_sole_admin() {
        let h = harness().await;
        let (super_user, _) = seed_member(&h, "root@example.com", Role::SuperAdmin).await;
        let (_, admin_seat) = seed_member(&h, "admin@example.com", Role::Admin).await;
        let super_admin = principal_for(&h, &super_user).await;

        // The super admin still administers the organization themselves, so
        // demoting the only plain admin leaves the org administered.
        let changed = h
            .service
            .change_role(&super_admin, admin_seat.id, Role::Manager, None)
            .await
            .unwrap();
        assert_eq!(changed.role, Role::Manager);
    }

    #[tokio::test]
    async fn the_final_administrator_cannot_be_stripped() {
        let h = harness().await;
        let (super_user, super_seat) = seed_member(&h, "root@example.com", Role::SuperAdmin).await;
        let (_, admin_seat) = seed_member(&h, "admin@example.com", Role::Admin).await;
        let super_admin = principal_for(&h, &super_user).await;

        // The actor's own seat vanishes after their principal was built;
        // the plain admin is now the organization's only administrator.
        h.store.delete_assignment(super_seat.id).await.unwrap();

        let err = h
            .service
            .change_role(&super_admin, admin_seat.id, Role::Manager, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let err = h
            .service
            .remove_member(&super_admin, admin_seat.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }
}
