//! Invitation lifecycle: create, accept, decline, revoke, resend.
//!
//! Invitation tokens are single-use and short-lived, so they are stored
//! raw; that is what keeps lookup-by-token a plain indexed query.
//! Acceptance goes through [`haven_store::InvitationStore::apply_acceptance`],
//! which flips the status and creates the membership in one transaction,
//! so two racing acceptors can never both win.

use std::sync::Arc;

use chrono::Duration;

use haven_auth::password::{PasswordHasher, PasswordPolicy};
use haven_auth::principal::Principal;
use haven_auth::token::{DeviceInfo, TokenService, opaque_token};
use haven_core::config::{AuthConfig, InvitationConfig};
use haven_core::error::AppError;
use haven_core::result::AppResult;
use haven_core::traits::{Clock, EmailMessage, Mailer};
use haven_core::types::{AssignmentId, InvitationId, OrganizationId, PropertyId, UnitId, UserId};
use haven_entity::{
    Invitation, InvitationStatus, Permission, PermissionOverrides, Role, RoleAssignment, User,
};
use haven_store::Store;

use crate::account::AuthSession;

/// What the inviter fills in.
#[derive(Debug, Clone)]
pub struct CreateInvitationInput {
    pub email: String,
    pub role: Role,
    pub property_id: Option<PropertyId>,
    pub unit_id: Option<UnitId>,
    pub permission_overrides: PermissionOverrides,
}

/// What the recipient submits when accepting.
///
/// For a brand-new account `password`, `first_name` and `last_name` are
/// required and create the user. When the email already belongs to an
/// account, `password` must instead match that account's current
/// password; the name fields are ignored.
#[derive(Debug, Clone)]
pub struct AcceptInvitationInput {
    pub token: String,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Walks invitations through their state machine.
#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
    clock: Arc<dyn Clock>,
    mailer: Arc<dyn Mailer>,
    auth_config: AuthConfig,
    config: InvitationConfig,
}

impl InvitationService {
    pub fn new(
        store: Arc<dyn Store>,
        tokens: TokenService,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
        auth_config: AuthConfig,
        config: InvitationConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher: PasswordHasher::new(),
            policy: PasswordPolicy::new(&auth_config),
            clock,
            mailer,
            auth_config,
            config,
        }
    }

    /// Creates a pending invitation and emails the acceptance link.
    ///
    /// The inviter needs `invite_users` in the target organization and
    /// cannot offer a role above their own highest role there. Email
    /// delivery is best-effort: the invitation stands even when the
    /// message bounces, and `resend` can retry it.
    pub async fn create(
        &self,
        inviter: &Principal,
        organization_id: OrganizationId,
        input: CreateInvitationInput,
    ) -> AppResult<Invitation> {
        if !inviter.can_in_org(organization_id, Permission::InviteUsers) {
            return Err(AppError::insufficient_permissions(
                "You do not have permission to invite users to this organization",
            ));
        }
        let inviter_level = inviter.highest_level_in_org(organization_id).unwrap_or(0);
        if input.role.privilege_level() > inviter_level {
            return Err(AppError::insufficient_permissions(
                "You cannot invite someone at a role above your own",
            ));
        }

        let email = input.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AppError::validation("Email is required"));
        }

        let Some(organization) = self.store.find_organization(organization_id).await? else {
            return Err(AppError::not_found("Organization not found"));
        };
        if self
            .store
            .pending_invitation_for(organization_id, &email)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "A pending invitation already exists for this email",
            ));
        }

        let now = self.clock.now();
        let invitation = Invitation {
            id: InvitationId::new(),
            organization_id,
            email,
            role: input.role,
            property_id: input.property_id,
            unit_id: input.unit_id,
            permission_overrides: input.permission_overrides,
            invited_by: inviter.user_id,
            token: opaque_token(),
            status: InvitationStatus::Pending,
            expires_at: now + Duration::days(self.config.expiry_days),
            accepted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_invitation(&invitation).await?;

        tracing::info!(
            target: "audit",
            invitation_id = %invitation.id,
            organization_id = %organization_id,
            invited_by = %inviter.user_id,
            role = %invitation.role,
            "Invitation created"
        );

        if let Err(error) = self
            .mailer
            .send(&self.invitation_email(&invitation, &organization.name))
            .await
        {
            tracing::warn!(
                invitation_id = %invitation.id,
                error = %error,
                "Failed to send invitation email"
            );
        }

        Ok(invitation)
    }

    /// Accepts an invitation, creating the account when the email is new.
    ///
    /// The winner of a racing double-accept is decided by the store; the
    /// loser sees the invitation as no longer valid. A successful accept
    /// logs the member in.
    pub async fn accept(
        &self,
        input: AcceptInvitationInput,
        device: &DeviceInfo,
    ) -> AppResult<AuthSession> {
        let Some(invitation) = self.store.find_invitation_by_token(&input.token).await? else {
            return Err(AppError::not_found("Invitation not found"));
        };

        if invitation.status != InvitationStatus::Pending {
            return Err(AppError::invalid_token("Invitation is no longer valid"));
        }
        let now = self.clock.now();
        if invitation.is_expired(now) {
            // Belt and braces; the sweeper flips these in the background.
            let _ = self
                .store
                .transition_invitation(
                    invitation.id,
                    InvitationStatus::Pending,
                    InvitationStatus::Expired,
                    now,
                )
                .await;
            return Err(AppError::invalid_token("Invitation has expired"));
        }

        match self.store.find_user_by_email(&invitation.email).await? {
            Some(user) => self.accept_as_existing(invitation, user, input, device).await,
            None => self.accept_as_new(invitation, input, device).await,
        }
    }

    /// Declines a pending invitation. Needs only the token, not a login.
    pub async fn decline(&self, token: &str) -> AppResult<()> {
        let Some(invitation) = self.store.find_invitation_by_token(token).await? else {
            return Err(AppError::not_found("Invitation not found"));
        };
        let flipped = self
            .store
            .transition_invitation(
                invitation.id,
                InvitationStatus::Pending,
                InvitationStatus::Declined,
                self.clock.now(),
            )
            .await?;
        if !flipped {
            return Err(AppError::invalid_token("Invitation is no longer valid"));
        }

        tracing::info!(target: "audit", invitation_id = %invitation.id, "Invitation declined");
        Ok(())
    }

    /// Withdraws a pending invitation.
    pub async fn revoke(&self, actor: &Principal, id: InvitationId) -> AppResult<()> {
        let Some(invitation) = self.store.find_invitation(id).await? else {
            return Err(AppError::not_found("Invitation not found"));
        };
        self.authorize_manage(actor, &invitation)?;

        let flipped = self
            .store
            .transition_invitation(
                id,
                InvitationStatus::Pending,
                InvitationStatus::Revoked,
                self.clock.now(),
            )
            .await?;
        if !flipped {
            return Err(AppError::conflict("Only pending invitations can be revoked"));
        }

        tracing::info!(
            target: "audit",
            invitation_id = %id,
            revoked_by = %actor.user_id,
            "Invitation revoked"
        );
        Ok(())
    }

    /// Replaces the token of a pending invitation and emails it again.
    ///
    /// The old token stops working immediately.
    pub async fn resend(&self, actor: &Principal, id: InvitationId) -> AppResult<Invitation> {
        let Some(mut invitation) = self.store.find_invitation(id).await? else {
            return Err(AppError::not_found("Invitation not found"));
        };
        self.authorize_manage(actor, &invitation)?;

        let now = self.clock.now();
        let token = opaque_token();
        let expires_at = now + Duration::days(self.config.expiry_days);
        let refreshed = self
            .store
            .refresh_invitation_token(id, &token, expires_at, now)
            .await?;
        if !refreshed {
            return Err(AppError::conflict("Only pending invitations can be resent"));
        }
        invitation.token = token;
        invitation.expires_at = expires_at;
        invitation.updated_at = now;

        tracing::info!(target: "audit", invitation_id = %id, "Invitation resent");

        if let Some(organization) = self.store.find_organization(invitation.organization_id).await?
        {
            if let Err(error) = self
                .mailer
                .send(&self.invitation_email(&invitation, &organization.name))
                .await
            {
                tracing::warn!(
                    invitation_id = %invitation.id,
                    error = %error,
                    "Failed to send invitation email"
                );
            }
        }

        Ok(invitation)
    }

    /// All invitations of an organization, newest first.
    pub async fn list(
        &self,
        actor: &Principal,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Invitation>> {
        if !actor.can_in_org(organization_id, Permission::InviteUsers) {
            return Err(AppError::insufficient_permissions(
                "You do not have permission to view invitations for this organization",
            ));
        }
        self.store.invitations_for_org(organization_id).await
    }

    /// Flips every overdue pending invitation to expired.
    pub async fn cleanup_expired(&self) -> AppResult<u64> {
        self.store.mark_expired_invitations(self.clock.now()).await
    }

    async fn accept_as_existing(
        &self,
        invitation: Invitation,
        mut user: User,
        input: AcceptInvitationInput,
        device: &DeviceInfo,
    ) -> AppResult<AuthSession> {
        let Some(password) = input.password.as_deref() else {
            return Err(AppError::authentication_required(
                "This email already has an account; confirm its password to accept",
            ));
        };

        if !user.is_active {
            return Err(AppError::account_deactivated(
                "This account has been deactivated",
            ));
        }
        let now = self.clock.now();
        if user.is_locked(now) {
            return Err(AppError::authentication_required(
                "Account is temporarily locked. Try again later.",
            ));
        }
        if !self.hasher.verify_password(password, &user.password_hash)? {
            let attempts = user.failed_login_attempts + 1;
            let locked_until = (attempts >= self.auth_config.max_failed_attempts)
                .then(|| now + Duration::minutes(self.auth_config.lockout_duration_minutes));
            self.store
                .record_login_failure(user.id, attempts, locked_until)
                .await?;
            return Err(AppError::authentication_required(
                "Invalid email or password",
            ));
        }

        let existing = self.store.assignments_for_user(user.id).await?;
        let assignment = self.assignment_from(&invitation, user.id, existing.is_empty(), now);
        // Accepting through the emailed link proves control of the inbox.
        let verify_user = (!user.email_verified).then_some(user.id);

        let applied = self
            .store
            .apply_acceptance(invitation.id, now, None, verify_user, &assignment)
            .await?;
        if !applied {
            return Err(AppError::invalid_token("Invitation is no longer valid"));
        }
        self.store.record_login_success(user.id, now).await?;
        user.email_verified = true;
        user.last_login_at = Some(now);

        tracing::info!(
            target: "audit",
            invitation_id = %invitation.id,
            user_id = %user.id,
            organization_id = %invitation.organization_id,
            "Invitation accepted by existing user"
        );

        let role = existing
            .iter()
            .map(|a| a.role)
            .chain(std::iter::once(invitation.role))
            .max_by_key(|r| r.privilege_level())
            .unwrap_or(invitation.role);
        let tokens = self.tokens.issue_pair(&user, role, device).await?;
        Ok(AuthSession { user, tokens })
    }

    async fn accept_as_new(
        &self,
        invitation: Invitation,
        input: AcceptInvitationInput,
        device: &DeviceInfo,
    ) -> AppResult<AuthSession> {
        let Some(password) = input.password.as_deref() else {
            return Err(AppError::validation("Password is required"));
        };
        let first_name = input
            .first_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::validation("First name is required"))?
            .to_string();
        let last_name = input
            .last_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::validation("Last name is required"))?
            .to_string();

        self.policy
            .validate(password, &[&invitation.email, &first_name, &last_name])?;

        let now = self.clock.now();
        let user = User {
            id: UserId::new(),
            email: invitation.email.clone(),
            password_hash: self.hasher.hash_password(password)?,
            first_name,
            last_name,
            phone: input.phone,
            is_active: true,
            // The invitation email is the proof of address ownership.
            email_verified: true,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        let assignment = self.assignment_from(&invitation, user.id, true, now);

        let applied = self
            .store
            .apply_acceptance(invitation.id, now, Some(&user), None, &assignment)
            .await?;
        if !applied {
            return Err(AppError::invalid_token("Invitation is no longer valid"));
        }

        tracing::info!(
            target: "audit",
            invitation_id = %invitation.id,
            user_id = %user.id,
            organization_id = %invitation.organization_id,
            "Invitation accepted by new user"
        );

        let tokens = self.tokens.issue_pair(&user, invitation.role, device).await?;
        Ok(AuthSession { user, tokens })
    }

    /// The assignment an acceptance creates, scope carried over verbatim.
    ///
    /// The new assignment becomes primary only when the acceptor holds no
    /// assignment anywhere yet; an existing primary is never displaced.
    fn assignment_from(
        &self,
        invitation: &Invitation,
        user_id: UserId,
        is_primary: bool,
        now: chrono::DateTime<chrono::Utc>,
    ) -> RoleAssignment {
        RoleAssignment {
            id: AssignmentId::new(),
            user_id,
            organization_id: invitation.organization_id,
            role: invitation.role,
            property_id: invitation.property_id,
            unit_id: invitation.unit_id,
            permission_overrides: invitation.permission_overrides.clone(),
            is_primary,
            created_at: now,
            updated_at: now,
        }
    }

    fn authorize_manage(&self, actor: &Principal, invitation: &Invitation) -> AppResult<()> {
        let allowed = invitation.invited_by == actor.user_id
            || actor.can_in_org(invitation.organization_id, Permission::ManageRoles);
        if allowed {
            Ok(())
        } else {
            Err(AppError::insufficient_permissions(
                "You cannot manage this invitation",
            ))
        }
    }

    fn invitation_email(&self, invitation: &Invitation, organization_name: &str) -> EmailMessage {
        EmailMessage {
            to: invitation.email.clone(),
            subject: format!("You have been invited to join {organization_name} on Haven"),
            body: format!(
                "Hello,\n\nYou have been invited to join {} on Haven as {}.\n\n\
                 Accept your invitation:\n{}?token={}\n\n\
                 This invitation expires on {}.",
                organization_name,
                invitation.role,
                self.config.accept_url_base,
                invitation.token,
                invitation.expires_at.format("%Y-%m-%d"),
            ),
        }
    }
}
