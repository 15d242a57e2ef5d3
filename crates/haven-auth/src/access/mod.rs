//! Requirement-based authorization decisions.

pub mod requirement;
pub mod resolver;

pub use requirement::{AccessRequirement, CustomCheck, ResourceRule};
pub use resolver::AccessResolver;
