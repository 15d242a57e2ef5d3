//! # haven-core
//!
//! Foundation crate for the Haven property-management platform: the
//! configuration tree, typed identifiers, the clock and mailer seams, and
//! the error vocabulary every other crate speaks.
//!
//! Nothing in here depends on another Haven crate.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
