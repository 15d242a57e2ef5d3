//! Account lifecycle: registration, login, refresh, passwords, sessions.

use std::sync::Arc;

use chrono::Duration;

use haven_auth::password::{PasswordHasher, PasswordPolicy};
use haven_auth::principal::Principal;
use haven_auth::token::{DeviceInfo, TokenPair, TokenService, opaque_token, token_digest};
use haven_core::config::AuthConfig;
use haven_core::error::AppError;
use haven_core::result::AppResult;
use haven_core::traits::{Clock, EmailMessage, Mailer};
use haven_core::types::{AssignmentId, OrganizationId, ResetTokenId, UserId};
use haven_entity::{
    Organization, PasswordResetToken, PermissionOverrides, RefreshTokenRecord, Role,
    RoleAssignment, User,
};
use haven_store::Store;

/// Everything a fresh sign-up provides.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub organization_name: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// The result of any flow that leaves the caller logged in.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub tokens: TokenPair,
}

/// Registration, login, and credential management.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
    clock: Arc<dyn Clock>,
    mailer: Arc<dyn Mailer>,
    config: AuthConfig,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn Store>,
        tokens: TokenService,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
        config: AuthConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher: PasswordHasher::new(),
            policy: PasswordPolicy::new(&config),
            clock,
            mailer,
            config,
        }
    }

    /// Creates an organization together with its first admin user.
    ///
    /// The founding user starts with `email_verified = false`; their
    /// admin assignment is the primary one.
    pub async fn register(
        &self,
        input: RegisterInput,
        device: &DeviceInfo,
    ) -> AppResult<AuthSession> {
        let email = input.email.trim().to_lowercase();
        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();
        let organization_name = input.organization_name.trim().to_string();

        self.policy
            .validate(&input.password, &[&email, &first_name, &last_name])?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::conflict(
                "An account with this email already exists",
            ));
        }

        let now = self.clock.now();
        let organization = Organization {
            id: OrganizationId::new(),
            name: organization_name,
            created_at: now,
            updated_at: now,
        };
        let user = User {
            id: UserId::new(),
            email,
            password_hash: self.hasher.hash_password(&input.password)?,
            first_name,
            last_name,
            phone: input.phone,
            is_active: true,
            email_verified: false,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let assignment = RoleAssignment {
            id: AssignmentId::new(),
            user_id: user.id,
            organization_id: organization.id,
            role: Role::Admin,
            property_id: None,
            unit_id: None,
            permission_overrides: PermissionOverrides::new(),
            is_primary: true,
            created_at: now,
            updated_at: now,
        };

        self.store
            .register_organization(&organization, &user, &assignment)
            .await?;

        tracing::info!(
            target: "audit",
            user_id = %user.id,
            organization_id = %organization.id,
            "Organization registered"
        );

        let tokens = self.tokens.issue_pair(&user, Role::Admin, device).await?;
        Ok(AuthSession { user, tokens })
    }

    /// Verifies credentials and hands out a token pair.
    ///
    /// Failed attempts are counted per user; once the configured limit is
    /// reached the account is locked for a fixed window. Lookup misses and
    /// bad passwords share one error message.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device: &DeviceInfo,
    ) -> AppResult<AuthSession> {
        let email = email.trim().to_lowercase();
        let Some(mut user) = self.store.find_user_by_email(&email).await? else {
            return Err(AppError::authentication_required(
                "Invalid email or password",
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
            let locked_until = (attempts >= self.config.max_failed_attempts)
                .then(|| now + Duration::minutes(self.config.lockout_duration_minutes));
            self.store
                .record_login_failure(user.id, attempts, locked_until)
                .await?;
            if locked_until.is_some() {
                tracing::warn!(
                    target: "audit",
                    user_id = %user.id,
                    attempts,
                    "Account locked after repeated failed logins"
                );
            }
            return Err(AppError::authentication_required(
                "Invalid email or password",
            ));
        }

        self.store.record_login_success(user.id, now).await?;
        user.failed_login_attempts = 0;
        user.locked_until = None;
        user.last_login_at = Some(now);

        let role = self.highest_role(user.id).await?;
        let tokens = self.tokens.issue_pair(&user, role, device).await?;

        tracing::info!(target: "audit", user_id = %user.id, "User logged in");
        Ok(AuthSession { user, tokens })
    }

    /// Rotates a refresh token and issues a fresh access token.
    ///
    /// A deactivated account cannot refresh; hitting this path burns every
    /// session the account still has.
    pub async fn refresh(&self, refresh_token: &str, device: &DeviceInfo) -> AppResult<AuthSession> {
        let (rotated, user_id) = self.tokens.rotate(refresh_token, device).await?;

        let Some(user) = self.store.find_user(user_id).await? else {
            return Err(AppError::invalid_token("Token subject no longer exists"));
        };
        if !user.is_active {
            self.tokens.revoke_all_for_user(user.id).await?;
            return Err(AppError::account_deactivated(
                "This account has been deactivated",
            ));
        }

        let role = self.highest_role(user.id).await?;
        let (access_token, access_expires_at) = self.tokens.issue_access(&user, role)?;

        Ok(AuthSession {
            user,
            tokens: TokenPair {
                access_token,
                access_expires_at,
                refresh_token: rotated,
            },
        })
    }

    /// Revokes one refresh token. Unknown tokens are ignored.
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        self.tokens.revoke(refresh_token).await
    }

    /// Changes the caller's password and logs out every session.
    pub async fn change_password(
        &self,
        principal: &Principal,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let Some(user) = self.store.find_user(principal.user_id).await? else {
            return Err(AppError::not_found("User not found"));
        };

        if !self
            .hasher
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AppError::validation("Current password is incorrect"));
        }
        self.policy.validate_not_same(current_password, new_password)?;
        self.policy.validate(
            new_password,
            &[&user.email, &user.first_name, &user.last_name],
        )?;

        let hash = self.hasher.hash_password(new_password)?;
        self.store
            .set_password_hash(user.id, &hash, self.clock.now())
            .await?;
        self.tokens.revoke_all_for_user(user.id).await?;

        tracing::info!(target: "audit", user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Sends a reset code if the email belongs to an account.
    ///
    /// Always succeeds from the caller's point of view unless delivery
    /// itself fails, so the endpoint cannot be used to probe for accounts.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let now = self.clock.now();
        let raw = opaque_token();
        let record = PasswordResetToken {
            id: ResetTokenId::new(),
            user_id: user.id,
            token_hash: token_digest(&raw),
            expires_at: now + Duration::minutes(self.config.reset_token_ttl_minutes),
            used_at: None,
            created_at: now,
        };
        self.store.insert_reset_token(&record).await?;

        self.mailer
            .send(&EmailMessage {
                to: user.email.clone(),
                subject: "Reset your Haven password".to_string(),
                body: format!(
                    "Hello {},\n\nYour password reset code is:\n\n{}\n\nIt expires in {} minutes. \
                     If you did not request a reset, you can ignore this email.",
                    user.first_name, raw, self.config.reset_token_ttl_minutes
                ),
            })
            .await?;

        tracing::info!(target: "audit", user_id = %user.id, "Password reset requested");
        Ok(())
    }

    /// Redeems a reset code, sets the new password, and burns every session.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let Some(record) = self
            .store
            .find_reset_token_by_hash(&token_digest(token))
            .await?
        else {
            return Err(AppError::invalid_token(
                "Reset token is invalid or has expired",
            ));
        };

        let now = self.clock.now();
        if !record.is_usable(now) {
            return Err(AppError::invalid_token(
                "Reset token is invalid or has expired",
            ));
        }
        let Some(user) = self.store.find_user(record.user_id).await? else {
            return Err(AppError::invalid_token(
                "Reset token is invalid or has expired",
            ));
        };

        self.policy.validate(
            new_password,
            &[&user.email, &user.first_name, &user.last_name],
        )?;

        // Single-use: losing the race to another redeem attempt fails here.
        if !self.store.consume_reset_token(record.id, now).await? {
            return Err(AppError::invalid_token(
                "Reset token is invalid or has expired",
            ));
        }

        let hash = self.hasher.hash_password(new_password)?;
        self.store.set_password_hash(user.id, &hash, now).await?;
        self.tokens.revoke_all_for_user(user.id).await?;

        tracing::info!(target: "audit", user_id = %user.id, "Password reset completed");
        Ok(())
    }

    /// Active refresh sessions for the caller, newest first.
    pub async fn sessions(&self, principal: &Principal) -> AppResult<Vec<RefreshTokenRecord>> {
        self.tokens.list_active_sessions(principal.user_id).await
    }

    /// Revokes every session bound to one device.
    pub async fn revoke_device(&self, principal: &Principal, device_id: &str) -> AppResult<u64> {
        let revoked = self
            .tokens
            .revoke_device(principal.user_id, device_id)
            .await?;
        if revoked > 0 {
            tracing::info!(
                target: "audit",
                user_id = %principal.user_id,
                device_id,
                revoked,
                "Device sessions revoked"
            );
        }
        Ok(revoked)
    }

    /// Highest role the user holds anywhere, floored at tenant.
    ///
    /// Users can exist with no assignments at all (for example after being
    /// removed from their only organization); they still authenticate, but
    /// carry no permissions.
    async fn highest_role(&self, user_id: UserId) -> AppResult<Role> {
        let assignments = self.store.assignments_for_user(user_id).await?;
        Ok(assignments
            .iter()
            .map(|a| a.role)
            .max_by_key(|r| r.privilege_level())
            .unwrap_or(Role::Tenant))
    }
}
