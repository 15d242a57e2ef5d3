//! Store traits the services program against.
//!
//! Methods that must be atomic under concurrency (token rotation,
//! invitation acceptance, registration bootstrap) are trait methods
//! rather than call-site transactions, so every implementation owns its
//! own atomicity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use haven_core::result::AppResult;
use haven_core::types::{
    AssignmentId, InvitationId, OrganizationId, ResetTokenId, TokenId, UserId,
};
use haven_entity::{
    Invitation, InvitationStatus, Invoice, Lease, MaintenanceRequest, Organization,
    PasswordResetToken, PermissionOverrides, Property, RefreshTokenRecord, ResourceFacts,
    ResourceKind, Role, RoleAssignment, Unit, User,
};

/// User account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Duplicate emails are a conflict.
    async fn insert_user(&self, user: &User) -> AppResult<()>;

    /// Find a user by primary key.
    async fn find_user(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Record a failed login: the new attempt count and, when the
    /// threshold was crossed, the lockout deadline.
    async fn record_login_failure(
        &self,
        id: UserId,
        attempts: i32,
        locked_until: Option<DateTime<Utc>>,
    ) -> AppResult<()>;

    /// Record a successful login: reset the failure counter and stamp
    /// `last_login_at`.
    async fn record_login_success(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()>;

    /// Replace the password hash.
    async fn set_password_hash(&self, id: UserId, hash: &str, at: DateTime<Utc>) -> AppResult<()>;

    /// Mark the account's email address as verified.
    async fn mark_email_verified(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()>;

    /// Activate or deactivate the account.
    async fn set_user_active(&self, id: UserId, active: bool, at: DateTime<Utc>) -> AppResult<()>;
}

/// Organization persistence.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Insert a new organization.
    async fn insert_organization(&self, organization: &Organization) -> AppResult<()>;

    /// Find an organization by primary key.
    async fn find_organization(&self, id: OrganizationId) -> AppResult<Option<Organization>>;

    /// Registration bootstrap: create the organization, its first user,
    /// and the user's admin assignment in a single transaction.
    async fn register_organization(
        &self,
        organization: &Organization,
        user: &User,
        assignment: &RoleAssignment,
    ) -> AppResult<()>;
}

/// Role assignment persistence.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Insert a new assignment. An identical (user, organization, role,
    /// property, unit) combination is a conflict.
    async fn insert_assignment(&self, assignment: &RoleAssignment) -> AppResult<()>;

    /// Find an assignment by primary key.
    async fn find_assignment(&self, id: AssignmentId) -> AppResult<Option<RoleAssignment>>;

    /// All assignments held by a user, across organizations.
    async fn assignments_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>>;

    /// All assignments within an organization.
    async fn assignments_for_org(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Change an assignment's role; `overrides` of `None` keeps the
    /// existing permission overrides.
    async fn update_assignment_role(
        &self,
        id: AssignmentId,
        role: Role,
        overrides: Option<&PermissionOverrides>,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Make one assignment the user's primary, clearing every other
    /// primary flag of the same user atomically.
    async fn set_primary_assignment(
        &self,
        user_id: UserId,
        id: AssignmentId,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Delete an assignment.
    async fn delete_assignment(&self, id: AssignmentId) -> AppResult<()>;

    /// Number of admin-or-above assignments within an organization.
    async fn count_org_admins(&self, organization_id: OrganizationId) -> AppResult<i64>;
}

/// Refresh token persistence.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Insert a freshly issued token record.
    async fn insert_refresh_token(&self, token: &RefreshTokenRecord) -> AppResult<()>;

    /// Find a token record by its stored digest.
    async fn find_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>>;

    /// Atomically revoke `old_id`, only if it is still unrevoked, and
    /// insert its replacement. Returns `false` when the old record was
    /// already revoked, i.e. this rotation lost a race, in which case the
    /// replacement is not inserted.
    async fn rotate_refresh_token(
        &self,
        old_id: TokenId,
        revoked_at: DateTime<Utc>,
        replacement: &RefreshTokenRecord,
    ) -> AppResult<bool>;

    /// Revoke a single token. Returns `false` when it was already revoked.
    async fn revoke_refresh_token(&self, id: TokenId, at: DateTime<Utc>) -> AppResult<bool>;

    /// Revoke every unrevoked token of a family. Returns the count.
    async fn revoke_token_family(&self, family_id: Uuid, at: DateTime<Utc>) -> AppResult<u64>;

    /// Revoke every unrevoked token of a user. Returns the count.
    async fn revoke_tokens_for_user(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64>;

    /// Revoke every unrevoked token a user holds on one device.
    async fn revoke_tokens_for_device(
        &self,
        user_id: UserId,
        device_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// All tokens of a user that can still authenticate.
    async fn active_refresh_tokens(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RefreshTokenRecord>>;

    /// Delete expired tokens and tokens revoked before `cutoff`.
    async fn purge_dead_refresh_tokens(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Invitation persistence.
#[async_trait]
pub trait InvitationStore: Send + Sync {
    /// Insert a new invitation. A second pending invitation for the same
    /// organization and email is a conflict.
    async fn insert_invitation(&self, invitation: &Invitation) -> AppResult<()>;

    /// Find an invitation by primary key.
    async fn find_invitation(&self, id: InvitationId) -> AppResult<Option<Invitation>>;

    /// Find an invitation by its acceptance token.
    async fn find_invitation_by_token(&self, token: &str) -> AppResult<Option<Invitation>>;

    /// The pending invitation for an organization/email pair, if any.
    async fn pending_invitation_for(
        &self,
        organization_id: OrganizationId,
        email: &str,
    ) -> AppResult<Option<Invitation>>;

    /// All invitations of an organization, newest first.
    async fn invitations_for_org(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Invitation>>;

    /// Conditional lifecycle transition. Returns `false` when the
    /// invitation was not in the `from` state; nothing changes then.
    async fn transition_invitation(
        &self,
        id: InvitationId,
        from: InvitationStatus,
        to: InvitationStatus,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Replace the token and expiry of a still-pending invitation.
    /// Returns `false` when the invitation is no longer pending.
    async fn refresh_invitation_token(
        &self,
        id: InvitationId,
        token: &str,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Atomic acceptance: flip pending→accepted, create the joining user
    /// (or mark an existing account's email verified), and insert the
    /// role assignment, all in one transaction. Returns `false` when the
    /// invitation was no longer pending, in which case nothing happened.
    async fn apply_acceptance(
        &self,
        id: InvitationId,
        accepted_at: DateTime<Utc>,
        new_user: Option<&User>,
        verify_user: Option<UserId>,
        assignment: &RoleAssignment,
    ) -> AppResult<bool>;

    /// Flip every pending invitation past its expiry to expired.
    /// Idempotent; returns the number of invitations flipped.
    async fn mark_expired_invitations(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Password reset token persistence.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    /// Insert a freshly issued reset token.
    async fn insert_reset_token(&self, token: &PasswordResetToken) -> AppResult<()>;

    /// Find a reset token by its stored digest.
    async fn find_reset_token_by_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<PasswordResetToken>>;

    /// Single-use consumption. Returns `false` when already consumed.
    async fn consume_reset_token(&self, id: ResetTokenId, used_at: DateTime<Utc>)
    -> AppResult<bool>;

    /// Delete reset tokens that expired before `cutoff`.
    async fn purge_dead_reset_tokens(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

/// Domain resource persistence, reduced to what access decisions need.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Insert a property record.
    async fn insert_property(&self, property: &Property) -> AppResult<()>;

    /// Insert a unit record.
    async fn insert_unit(&self, unit: &Unit) -> AppResult<()>;

    /// Insert a lease record.
    async fn insert_lease(&self, lease: &Lease) -> AppResult<()>;

    /// Insert an invoice record.
    async fn insert_invoice(&self, invoice: &Invoice) -> AppResult<()>;

    /// Insert a maintenance request record.
    async fn insert_maintenance_request(&self, request: &MaintenanceRequest) -> AppResult<()>;

    /// Ownership and placement facts for one resource, or `None` when it
    /// does not exist.
    async fn resource_facts(&self, kind: ResourceKind, id: Uuid)
    -> AppResult<Option<ResourceFacts>>;
}

/// One object granting access to every store the platform needs.
///
/// Blanket-implemented for any type that implements all the per-entity
/// store traits, so `Arc<PgStore>` and `Arc<MemoryStore>` both coerce to
/// `Arc<dyn Store>`.
pub trait Store:
    UserStore
    + OrganizationStore
    + AssignmentStore
    + RefreshTokenStore
    + InvitationStore
    + ResetTokenStore
    + ResourceStore
{
}

impl<T> Store for T where
    T: UserStore
        + OrganizationStore
        + AssignmentStore
        + RefreshTokenStore
        + InvitationStore
        + ResetTokenStore
        + ResourceStore
{
}
