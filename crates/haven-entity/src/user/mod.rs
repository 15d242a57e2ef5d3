//! User records and credential state.

pub mod model;

pub use model::User;
