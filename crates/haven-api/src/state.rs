//! Application state shared across all handlers.

use std::sync::Arc;

use haven_auth::access::AccessResolver;
use haven_auth::gate::AuthenticationGate;
use haven_auth::rbac::{PermissionResolver, RoleCatalog};
use haven_auth::token::{JwtCodec, TokenService};
use haven_core::config::HavenConfig;
use haven_core::traits::{Clock, Mailer};
use haven_service::{AccountService, InvitationService, MembershipService};
use haven_store::Store;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Everything inside
/// is either `Arc`-wrapped or internally `Arc`-backed, so cloning per
/// request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<HavenConfig>,
    /// Storage backend.
    pub store: Arc<dyn Store>,
    /// Bearer-token authentication.
    pub gate: AuthenticationGate,
    /// Requirement-based authorization decisions.
    pub access: AccessResolver,
    /// Account and session flows.
    pub accounts: AccountService,
    /// Invitation flows.
    pub invitations: InvitationService,
    /// Membership administration.
    pub memberships: MembershipService,
}

impl AppState {
    /// Wires every service from its dependencies.
    ///
    /// The store, clock, and mailer are injected so tests can assemble
    /// the exact same state over in-memory implementations.
    pub fn assemble(
        config: HavenConfig,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let codec = JwtCodec::new(&config.auth);
        let tokens = TokenService::new(store.clone(), codec, clock.clone(), &config.auth);
        let catalog = Arc::new(RoleCatalog::standard());
        let resolver = PermissionResolver::new(catalog);

        let gate = AuthenticationGate::new(store.clone(), tokens.clone(), resolver);
        let access = AccessResolver::new(store.clone());
        let accounts = AccountService::new(
            store.clone(),
            tokens.clone(),
            clock.clone(),
            mailer.clone(),
            config.auth.clone(),
        );
        let invitations = InvitationService::new(
            store.clone(),
            tokens.clone(),
            clock.clone(),
            mailer,
            config.auth.clone(),
            config.invitation.clone(),
        );
        let memberships = MembershipService::new(store.clone(), tokens, clock);

        Self {
            config: Arc::new(config),
            store,
            gate,
            access,
            accounts,
            invitations,
            memberships,
        }
    }
}
