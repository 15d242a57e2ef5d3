//! Business flows built on top of the store and auth layers.
//!
//! Each service owns one slice of the platform:
//!
//! - [`AccountService`]: registration, login, token refresh, password
//!   lifecycle and session management
//! - [`InvitationService`]: inviting people into an organization and
//!   walking an invitation through its state machine
//! - [`MembershipService`]: role changes, primary assignment selection
//!   and member removal
//!
//! Services take the storage trait object plus the auth primitives they
//! need, so tests can run them entirely against the in-memory store.

pub mod account;
pub mod invitation;
pub mod mailer;
pub mod membership;

pub use account::{AccountService, AuthSession, RegisterInput};
pub use invitation::{AcceptInvitationInput, CreateInvitationInput, InvitationService};
pub use mailer::{LogMailer, RecordingMailer};
pub use membership::MembershipService;
