//! Typed identifiers shared across the workspace.

pub mod id;

pub use id::*;
