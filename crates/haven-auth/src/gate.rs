//! Per-request authentication: bearer token in, `Principal` out.

use std::sync::Arc;

use haven_core::error::AppError;
use haven_core::result::AppResult;
use haven_store::Store;

use crate::principal::{Membership, Principal};
use crate::rbac::PermissionResolver;
use crate::token::TokenService;

/// Route-level authentication options.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateOptions {
    /// Reject callers whose email address is not verified.
    pub require_verified_email: bool,
}

/// Validates a bearer token and assembles the caller's `Principal`.
#[derive(Clone)]
pub struct AuthenticationGate {
    store: Arc<dyn Store>,
    tokens: TokenService,
    resolver: PermissionResolver,
}

impl AuthenticationGate {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, resolver: PermissionResolver) -> Self {
        Self {
            store,
            tokens,
            resolver,
        }
    }

    /// Authenticates with the default options.
    pub async fn authenticate(
        &self,
        bearer: Option<&str>,
        device_id: Option<String>,
    ) -> AppResult<Principal> {
        self.authenticate_with(bearer, device_id, GateOptions::default())
            .await
    }

    /// Full authentication pipeline: decode the token, load the account,
    /// check its status, resolve every membership, assemble the principal.
    pub async fn authenticate_with(
        &self,
        bearer: Option<&str>,
        device_id: Option<String>,
        options: GateOptions,
    ) -> AppResult<Principal> {
        let token =
            bearer.ok_or_else(|| AppError::authentication_required("Missing bearer token"))?;

        let claims = self.tokens.decode_access(token)?;
        let user_id = claims.user_id()?;

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::invalid_token("Token subject no longer exists"))?;

        if !user.is_active {
            return Err(AppError::account_deactivated(
                "This account has been deactivated",
            ));
        }

        if options.require_verified_email && !user.email_verified {
            return Err(AppError::email_not_verified(
                "Email address has not been verified",
            ));
        }

        let assignments = self.store.assignments_for_user(user.id).await?;
        let memberships = assignments
            .into_iter()
            .map(|assignment| {
                let permissions = self.resolver.resolve(&assignment);
                Membership {
                    assignment,
                    permissions,
                }
            })
            .collect();

        Ok(Principal::assemble(&user, memberships, device_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use haven_core::config::AuthConfig;
    use haven_core::error::ErrorKind;
    use haven_core::traits::SystemClock;
    use haven_core::types::{AssignmentId, OrganizationId, UserId};
    use haven_entity::{Permission, PermissionOverrides, Role, RoleAssignment, User};
    use haven_store::{AssignmentStore, MemoryStore, UserStore};

    use crate::rbac::RoleCatalog;
    use crate::token::JwtCodec;

    fn harness() -> (AuthenticationGate, TokenService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = AuthConfig {
            jwt_secret: "gate-test-secret".to_string(),
            ..AuthConfig::default()
        };
        let tokens = TokenService::new(
            store.clone(),
            JwtCodec::new(&config),
            Arc::new(SystemClock),
            &config,
        );
        let resolver = PermissionResolver::new(Arc::new(RoleCatalog::standard()));
        let gate = AuthenticationGate::new(store.clone(), tokens.clone(), resolver);
        (gate, tokens, store)
    }

    fn user(active: bool, verified: bool) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: "gate@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ga".to_string(),
            last_name: "Te".to_string(),
            phone: None,
            is_active: active,
            email_verified: verified,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn assignment(user_id: UserId, role: Role) -> RoleAssignment {
        let now = Utc::now();
        RoleAssignment {
            id: AssignmentId::new(),
            user_id,
            organization_id: OrganizationId::new(),
            role,
            property_id: None,
            unit_id: None,
            permission_overrides: PermissionOverrides::new(),
            is_primary: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn assembles_a_principal_from_a_valid_token() {
        let (gate, tokens, store) = harness();
        let user = user(true, true);
        store.insert_user(&user).await.unwrap();
        let assignment = assignment(user.id, Role::Manager);
        store.insert_assignment(&assignment).await.unwrap();

        let (token, _) = tokens.issue_access(&user, Role::Manager).unwrap();
        let principal = gate
            .authenticate(Some(&token), Some("phone-1".to_string()))
            .await
            .unwrap();

        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.organization_id, Some(assignment.organization_id));
        assert_eq!(principal.device_id.as_deref(), Some("phone-1"));
        assert!(principal.can(Permission::ManageLeases));
        assert!(!principal.can(Permission::ManageOrganization));
    }

    #[tokio::test]
    async fn missing_bearer_is_authentication_required() {
        let (gate, _tokens, _store) = harness();
        let err = gate.authenticate(None, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AuthenticationRequired);
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let (gate, _tokens, _store) = harness();
        let err = gate
            .authenticate(Some("definitely.not.valid"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOrExpiredToken);
    }

    #[tokio::test]
    async fn token_for_a_vanished_user_is_invalid() {
        let (gate, tokens, _store) = harness();
        // Issue a token without ever persisting the user.
        let ghost = user(true, true);
        let (token, _) = tokens.issue_access(&ghost, Role::Tenant).unwrap();

        let err = gate.authenticate(Some(&token), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOrExpiredToken);
    }

    #[tokio::test]
    async fn deactivated_accounts_are_rejected() {
        let (gate, tokens, store) = harness();
        let user = user(false, true);
        store.insert_user(&user).await.unwrap();

        let (token, _) = tokens.issue_access(&user, Role::Tenant).unwrap();
        let err = gate.authenticate(Some(&token), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AccountDeactivated);
    }

    #[tokio::test]
    async fn unverified_email_fails_only_when_required() {
        let (gate, tokens, store) = harness();
        let user = user(true, false);
        store.insert_user(&user).await.unwrap();
        let (token, _) = tokens.issue_access(&user, Role::Tenant).unwrap();

        gate.authenticate(Some(&token), None).await.unwrap();

        let err = gate
            .authenticate_with(
                Some(&token),
                None,
                GateOptions {
                    require_verified_email: true,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmailNotVerified);
    }
}
