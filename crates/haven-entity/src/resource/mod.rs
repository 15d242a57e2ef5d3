//! Domain resource records access decisions are scoped to.

pub mod model;

pub use model::{
    Invoice, Lease, MaintenanceRequest, Property, ResourceFacts, ResourceKind, ResourceRef, Unit,
};
