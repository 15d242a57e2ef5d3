//! Organization domain entities.

pub mod model;

pub use model::Organization;
