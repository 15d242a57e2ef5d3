//! Role catalog and permission resolution.

pub mod catalog;
pub mod resolver;

pub use catalog::RoleCatalog;
pub use resolver::PermissionResolver;
