//! What a caller must satisfy to pass an authorization check.
//!
//! A requirement lists independent grant criteria; satisfying any one of
//! them grants access. An empty requirement denies everyone, and there is
//! no implicit superAdmin bypass: routes that want superAdmin access list
//! the role explicitly.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use haven_entity::{ResourceKind, ResourceRef, Role};

use crate::principal::Principal;

/// A caller-supplied predicate over the principal.
pub type CustomCheck = Arc<dyn Fn(&Principal) -> bool + Send + Sync>;

/// Relationship-based grants against one resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceRule {
    /// The resource the request is about.
    pub target: ResourceRef,
    /// Grant the resource's owner (tenant on a lease, invoice recipient,
    /// request creator, property owner, the user themselves).
    pub allow_owner: bool,
    /// Grant members at manager level or above whose assignment covers
    /// the resource's property.
    pub allow_property_manager: bool,
    /// Grant any member of the resource's organization.
    pub allow_same_organization: bool,
}

impl ResourceRule {
    /// A rule against the given resource with no grants enabled yet.
    pub fn new(kind: ResourceKind, id: Uuid) -> Self {
        Self {
            target: ResourceRef::new(kind, id),
            allow_owner: false,
            allow_property_manager: false,
            allow_same_organization: false,
        }
    }

    /// Allow the resource's owner.
    pub fn owner(mut self) -> Self {
        self.allow_owner = true;
        self
    }

    /// Allow managers covering the resource's property.
    pub fn property_manager(mut self) -> Self {
        self.allow_property_manager = true;
        self
    }

    /// Allow any member of the resource's organization.
    pub fn same_organization(mut self) -> Self {
        self.allow_same_organization = true;
        self
    }
}

/// An authorization requirement built from independent grant criteria.
#[derive(Clone, Default)]
pub struct AccessRequirement {
    /// Grant if the principal holds any of these roles anywhere.
    pub allowed_roles: Vec<Role>,
    /// Grant if this predicate returns true.
    pub custom_check: Option<CustomCheck>,
    /// Grant by relationship to a resource.
    pub resource: Option<ResourceRule>,
}

impl AccessRequirement {
    /// An empty requirement. Until criteria are added it denies everyone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add roles whose holders are granted.
    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.allowed_roles.extend(roles);
        self
    }

    /// Add a custom predicate over the principal.
    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&Principal) -> bool + Send + Sync + 'static,
    {
        self.custom_check = Some(Arc::new(check));
        self
    }

    /// Add a relationship rule against one resource.
    pub fn resource(mut self, rule: ResourceRule) -> Self {
        self.resource = Some(rule);
        self
    }
}

impl fmt::Debug for AccessRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessRequirement")
            .field("allowed_roles", &self.allowed_roles)
            .field("custom_check", &self.custom_check.is_some())
            .field("resource", &self.resource)
            .finish()
    }
}
