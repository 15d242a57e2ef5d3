//! In-memory store using a Tokio mutex for single-process use.
//!
//! Backs the integration test suite and local experiments. Every
//! conditional update mirrors the PostgreSQL implementation: the same
//! uniqueness conflicts, the same `false` returns when a guarded
//! transition finds the row in the wrong state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use haven_core::error::AppError;
use haven_core::result::AppResult;
use haven_core::types::{
    AssignmentId, InvitationId, InvoiceId, LeaseId, MaintenanceRequestId, OrganizationId,
    PropertyId, ResetTokenId, TokenId, UnitId, UserId,
};
use haven_entity::{
    Invitation, InvitationStatus, Invoice, Lease, MaintenanceRequest, Organization,
    PasswordResetToken, PermissionOverrides, Property, RefreshTokenRecord, ResourceFacts,
    ResourceKind, Role, RoleAssignment, Unit, User,
};

use crate::traits::{
    AssignmentStore, InvitationStore, OrganizationStore, RefreshTokenStore, ResetTokenStore,
    ResourceStore, UserStore,
};

/// Internal state protected by the mutex.
#[derive(Debug, Default)]
struct InnerState {
    users: HashMap<UserId, User>,
    organizations: HashMap<OrganizationId, Organization>,
    assignments: HashMap<AssignmentId, RoleAssignment>,
    refresh_tokens: HashMap<TokenId, RefreshTokenRecord>,
    invitations: HashMap<InvitationId, Invitation>,
    reset_tokens: HashMap<ResetTokenId, PasswordResetToken>,
    properties: HashMap<PropertyId, Property>,
    units: HashMap<UnitId, Unit>,
    leases: HashMap<LeaseId, Lease>,
    invoices: HashMap<InvoiceId, Invoice>,
    maintenance_requests: HashMap<MaintenanceRequestId, MaintenanceRequest>,
}

impl InnerState {
    fn email_taken(&self, email: &str) -> bool {
        self.users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email))
    }

    fn assignment_scope_taken(&self, assignment: &RoleAssignment) -> bool {
        self.assignments.values().any(|a| {
            a.user_id == assignment.user_id
                && a.organization_id == assignment.organization_id
                && a.role == assignment.role
                && a.property_id == assignment.property_id
                && a.unit_id == assignment.unit_id
        })
    }
}

/// In-memory implementation of every store trait.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.email_taken(&user.email) {
            return Err(AppError::conflict(
                "An account with this email already exists",
            ));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn record_login_failure(
        &self,
        id: UserId,
        attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.failed_login_attempts = attempts;
            user.locked_until = locked_until;
        }
        Ok(())
    }

    async fn record_login_success(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.failed_login_attempts = 0;
            user.locked_until = None;
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn set_password_hash(&self, id: UserId, hash: &str, at: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.password_hash = hash.to_string();
            user.updated_at = at;
        }
        Ok(())
    }

    async fn mark_email_verified(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.email_verified = true;
            user.updated_at = at;
        }
        Ok(())
    }

    async fn set_user_active(&self, id: UserId, active: bool, at: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.is_active = active;
            user.updated_at = at;
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn insert_organization(&self, organization: &Organization) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state
            .organizations
            .insert(organization.id, organization.clone());
        Ok(())
    }

    async fn find_organization(&self, id: OrganizationId) -> AppResult<Option<Organization>> {
        let state = self.state.lock().await;
        Ok(state.organizations.get(&id).cloned())
    }

    async fn register_organization(
        &self,
        organization: &Organization,
        user: &User,
        assignment: &RoleAssignment,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.email_taken(&user.email) {
            return Err(AppError::conflict(
                "An account with this email already exists",
            ));
        }
        state
            .organizations
            .insert(organization.id, organization.clone());
        state.users.insert(user.id, user.clone());
        state.assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn insert_assignment(&self, assignment: &RoleAssignment) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.assignment_scope_taken(assignment) {
            return Err(AppError::conflict(
                "User already holds this role assignment",
            ));
        }
        state.assignments.insert(assignment.id, assignment.clone());
        Ok(())
    }

    async fn find_assignment(&self, id: AssignmentId) -> AppResult<Option<RoleAssignment>> {
        let state = self.state.lock().await;
        Ok(state.assignments.get(&id).cloned())
    }

    async fn assignments_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        let state = self.state.lock().await;
        let mut assignments: Vec<RoleAssignment> = state
            .assignments
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.created_at);
        Ok(assignments)
    }

    async fn assignments_for_org(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<RoleAssignment>> {
        let state = self.state.lock().await;
        let mut assignments: Vec<RoleAssignment> = state
            .assignments
            .values()
            .filter(|a| a.organization_id == organization_id)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.created_at);
        Ok(assignments)
    }

    async fn update_assignment_role(
        &self,
        id: AssignmentId,
        role: Role,
        overrides: Option<&PermissionOverrides>,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(assignment) = state.assignments.get_mut(&id) {
            assignment.role = role;
            if let Some(overrides) = overrides {
                assignment.permission_overrides = overrides.clone();
            }
            assignment.updated_at = at;
        }
        Ok(())
    }

    async fn set_primary_assignment(
        &self,
        user_id: UserId,
        id: AssignmentId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for assignment in state.assignments.values_mut() {
            if assignment.user_id != user_id {
                continue;
            }
            let make_primary = assignment.id == id;
            if assignment.is_primary != make_primary {
                assignment.is_primary = make_primary;
                assignment.updated_at = at;
            }
        }
        Ok(())
    }

    async fn delete_assignment(&self, id: AssignmentId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.assignments.remove(&id);
        Ok(())
    }

    async fn count_org_admins(&self, organization_id: OrganizationId) -> AppResult<i64> {
        let state = self.state.lock().await;
        let count = state
            .assignments
            .values()
            .filter(|a| a.organization_id == organization_id && a.role.is_admin())
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn insert_refresh_token(&self, token: &RefreshTokenRecord) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state
            .refresh_tokens
            .values()
            .any(|t| t.token_hash == token.token_hash)
        {
            return Err(AppError::conflict("Refresh token collision"));
        }
        state.refresh_tokens.insert(token.id, token.clone());
        Ok(())
    }

    async fn find_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .refresh_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn rotate_refresh_token(
        &self,
        old_id: TokenId,
        revoked_at: DateTime<Utc>,
        replacement: &RefreshTokenRecord,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.refresh_tokens.get_mut(&old_id) {
            Some(old) if !old.is_revoked => {
                old.is_revoked = true;
                old.revoked_at = Some(revoked_at);
                old.replaced_by = Some(replacement.id);
                old.last_used_at = Some(revoked_at);
            }
            _ => return Ok(false),
        }
        state
            .refresh_tokens
            .insert(replacement.id, replacement.clone());
        Ok(true)
    }

    async fn revoke_refresh_token(&self, id: TokenId, at: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.refresh_tokens.get_mut(&id) {
            Some(token) if !token.is_revoked => {
                token.is_revoked = true;
                token.revoked_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_token_family(&self, family_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut revoked = 0;
        for token in state.refresh_tokens.values_mut() {
            if token.family_id == family_id && !token.is_revoked {
                token.is_revoked = true;
                token.revoked_at = Some(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn revoke_tokens_for_user(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut revoked = 0;
        for token in state.refresh_tokens.values_mut() {
            if token.user_id == user_id && !token.is_revoked {
                token.is_revoked = true;
                token.revoked_at = Some(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn revoke_tokens_for_device(
        &self,
        user_id: UserId,
        device_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut revoked = 0;
        for token in state.refresh_tokens.values_mut() {
            if token.user_id == user_id
                && token.device_id.as_deref() == Some(device_id)
                && !token.is_revoked
            {
                token.is_revoked = true;
                token.revoked_at = Some(at);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn active_refresh_tokens(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RefreshTokenRecord>> {
        let state = self.state.lock().await;
        let mut tokens: Vec<RefreshTokenRecord> = state
            .refresh_tokens
            .values()
            .filter(|t| t.user_id == user_id && !t.is_revoked && t.expires_at > now)
            .cloned()
            .collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tokens)
    }

    async fn purge_dead_refresh_tokens(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.refresh_tokens.len();
        state.refresh_tokens.retain(|_, t| {
            let expired = t.expires_at < cutoff;
            let revoked_long_ago = t.is_revoked && t.revoked_at.is_some_and(|at| at < cutoff);
            !expired && !revoked_long_ago
        });
        Ok((before - state.refresh_tokens.len()) as u64)
    }
}

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn insert_invitation(&self, invitation: &Invitation) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let pending_exists = state.invitations.values().any(|i| {
            i.organization_id == invitation.organization_id
                && i.email.eq_ignore_ascii_case(&invitation.email)
                && i.status == InvitationStatus::Pending
        });
        if pending_exists {
            return Err(AppError::conflict(
                "A pending invitation already exists for this email",
            ));
        }
        if state
            .invitations
            .values()
            .any(|i| i.token == invitation.token)
        {
            return Err(AppError::conflict("Invitation token collision"));
        }
        state.invitations.insert(invitation.id, invitation.clone());
        Ok(())
    }

    async fn find_invitation(&self, id: InvitationId) -> AppResult<Option<Invitation>> {
        let state = self.state.lock().await;
        Ok(state.invitations.get(&id).cloned())
    }

    async fn find_invitation_by_token(&self, token: &str) -> AppResult<Option<Invitation>> {
        let state = self.state.lock().await;
        Ok(state
            .invitations
            .values()
            .find(|i| i.token == token)
            .cloned())
    }

    async fn pending_invitation_for(
        &self,
        organization_id: OrganizationId,
        email: &str,
    ) -> AppResult<Option<Invitation>> {
        let state = self.state.lock().await;
        Ok(state
            .invitations
            .values()
            .find(|i| {
                i.organization_id == organization_id
                    && i.email.eq_ignore_ascii_case(email)
                    && i.status == InvitationStatus::Pending
            })
            .cloned())
    }

    async fn invitations_for_org(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Invitation>> {
        let state = self.state.lock().await;
        let mut invitations: Vec<Invitation> = state
            .invitations
            .values()
            .filter(|i| i.organization_id == organization_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invitations)
    }

    async fn transition_invitation(
        &self,
        id: InvitationId,
        from: InvitationStatus,
        to: InvitationStatus,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.invitations.get_mut(&id) {
            Some(invitation) if invitation.status == from => {
                invitation.status = to;
                invitation.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn refresh_invitation_token(
        &self,
        id: InvitationId,
        token: &str,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.invitations.get_mut(&id) {
            Some(invitation) if invitation.status == InvitationStatus::Pending => {
                invitation.token = token.to_string();
                invitation.expires_at = expires_at;
                invitation.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn apply_acceptance(
        &self,
        id: InvitationId,
        accepted_at: DateTime<Utc>,
        new_user: Option<&User>,
        verify_user: Option<UserId>,
        assignment: &RoleAssignment,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;

        match state.invitations.get(&id) {
            Some(invitation) if invitation.status == InvitationStatus::Pending => {}
            _ => return Ok(false),
        }
        if let Some(user) = new_user {
            if state.email_taken(&user.email) {
                return Err(AppError::conflict(
                    "An account with this email already exists",
                ));
            }
        }
        if state.assignment_scope_taken(assignment) {
            return Err(AppError::conflict(
                "User already holds this role assignment",
            ));
        }

        if let Some(invitation) = state.invitations.get_mut(&id) {
            invitation.status = InvitationStatus::Accepted;
            invitation.accepted_at = Some(accepted_at);
            invitation.updated_at = accepted_at;
        }
        if let Some(user) = new_user {
            state.users.insert(user.id, user.clone());
        }
        if let Some(user_id) = verify_user {
            if let Some(user) = state.users.get_mut(&user_id) {
                user.email_verified = true;
                user.updated_at = accepted_at;
            }
        }
        state.assignments.insert(assignment.id, assignment.clone());
        Ok(true)
    }

    async fn mark_expired_invitations(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut expired = 0;
        for invitation in state.invitations.values_mut() {
            if invitation.status == InvitationStatus::Pending && invitation.expires_at < now {
                invitation.status = InvitationStatus::Expired;
                invitation.updated_at = now;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[async_trait]
impl ResetTokenStore for MemoryStore {
    async fn insert_reset_token(&self, token: &PasswordResetToken) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.reset_tokens.insert(token.id, token.clone());
        Ok(())
    }

    async fn find_reset_token_by_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<PasswordResetToken>> {
        let state = self.state.lock().await;
        Ok(state
            .reset_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn consume_reset_token(
        &self,
        id: ResetTokenId,
        used_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.reset_tokens.get_mut(&id) {
            Some(token) if token.used_at.is_none() => {
                token.used_at = Some(used_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_dead_reset_tokens(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.reset_tokens.len();
        state.reset_tokens.retain(|_, t| {
            let expired = t.expires_at < cutoff;
            let used_long_ago = t.used_at.is_some_and(|at| at < cutoff);
            !expired && !used_long_ago
        });
        Ok((before - state.reset_tokens.len()) as u64)
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn insert_property(&self, property: &Property) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.properties.insert(property.id, property.clone());
        Ok(())
    }

    async fn insert_unit(&self, unit: &Unit) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.units.insert(unit.id, unit.clone());
        Ok(())
    }

    async fn insert_lease(&self, lease: &Lease) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.leases.insert(lease.id, lease.clone());
        Ok(())
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn insert_maintenance_request(&self, request: &MaintenanceRequest) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.maintenance_requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn resource_facts(
        &self,
        kind: ResourceKind,
        id: Uuid,
    ) -> AppResult<Option<ResourceFacts>> {
        let state = self.state.lock().await;
        let facts = match kind {
            ResourceKind::Organization => state
                .organizations
                .get(&OrganizationId::from(id))
                .map(|org| ResourceFacts::organization(org.id)),
            ResourceKind::Property => {
                state
                    .properties
                    .get(&PropertyId::from(id))
                    .map(|p| ResourceFacts {
                        kind,
                        organization_ids: vec![p.organization_id],
                        property_id: Some(p.id),
                        owner_user_id: p.owner_user_id,
                    })
            }
            ResourceKind::Unit => state.units.get(&UnitId::from(id)).map(|u| ResourceFacts {
                kind,
                organization_ids: vec![u.organization_id],
                property_id: Some(u.property_id),
                owner_user_id: state
                    .properties
                    .get(&u.property_id)
                    .and_then(|p| p.owner_user_id),
            }),
            ResourceKind::Lease => state.leases.get(&LeaseId::from(id)).map(|l| ResourceFacts {
                kind,
                organization_ids: vec![l.organization_id],
                property_id: Some(l.property_id),
                owner_user_id: Some(l.tenant_user_id),
            }),
            ResourceKind::Invoice => {
                state
                    .invoices
                    .get(&InvoiceId::from(id))
                    .map(|i| ResourceFacts {
                        kind,
                        organization_ids: vec![i.organization_id],
                        property_id: i.property_id,
                        owner_user_id: Some(i.recipient_user_id),
                    })
            }
            ResourceKind::MaintenanceRequest => state
                .maintenance_requests
                .get(&MaintenanceRequestId::from(id))
                .map(|m| ResourceFacts {
                    kind,
                    organization_ids: vec![m.organization_id],
                    property_id: Some(m.property_id),
                    owner_user_id: Some(m.created_by_user_id),
                }),
            ResourceKind::User => {
                let user_id = UserId::from(id);
                state.users.get(&user_id).map(|_| {
                    let mut organization_ids: Vec<OrganizationId> = state
                        .assignments
                        .values()
                        .filter(|a| a.user_id == user_id)
                        .map(|a| a.organization_id)
                        .collect();
                    organization_ids.sort();
                    organization_ids.dedup();
                    ResourceFacts {
                        kind,
                        organization_ids,
                        property_id: None,
                        owner_user_id: Some(user_id),
                    }
                })
            }
        };

        Ok(facts)
    }
}
