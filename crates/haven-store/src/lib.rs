//! # haven-store
//!
//! Persistence layer for Haven. The store traits define the seam the
//! services program against; [`pg::PgStore`] implements them over
//! PostgreSQL, and [`memory::MemoryStore`] implements them in process
//! memory for tests and single-node development setups.

pub mod memory;
pub mod pg;
pub mod traits;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use traits::{
    AssignmentStore, InvitationStore, OrganizationStore, RefreshTokenStore, ResetTokenStore,
    ResourceStore, Store, UserStore,
};
