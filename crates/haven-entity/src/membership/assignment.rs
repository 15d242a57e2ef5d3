//! Role assignment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use haven_core::types::{AssignmentId, OrganizationId, PropertyId, UnitId, UserId};

use super::permission::PermissionOverrides;
use super::role::{Role, RoleScope};

/// Grants a user a role within an organization, optionally narrowed to a
/// property or a unit.
///
/// A user may hold several assignments across organizations; exactly one
/// of them is the primary assignment whose resolved permissions become the
/// request-time default.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleAssignment {
    /// Unique assignment identifier.
    pub id: AssignmentId,
    /// The user holding the role.
    pub user_id: UserId,
    /// The organization the role applies to.
    pub organization_id: OrganizationId,
    /// The granted role.
    pub role: Role,
    /// Narrows the assignment to one property (and its units).
    pub property_id: Option<PropertyId>,
    /// Narrows the assignment to one unit.
    pub unit_id: Option<UnitId>,
    /// Sparse permission adjustments applied on top of the role defaults.
    #[sqlx(json)]
    pub permission_overrides: PermissionOverrides,
    /// Whether this is the user's primary assignment.
    pub is_primary: bool,
    /// When the assignment was created.
    pub created_at: DateTime<Utc>,
    /// When the assignment was last updated.
    pub updated_at: DateTime<Utc>,
}

impl RoleAssignment {
    /// The effective scope context, derived from the narrowing columns.
    ///
    /// An assignment carrying a unit is unit-scoped even when it also
    /// carries a property.
    pub fn scope_context(&self) -> RoleScope {
        if self.unit_id.is_some() {
            RoleScope::Unit
        } else if self.property_id.is_some() {
            RoleScope::Property
        } else if self.role == Role::SuperAdmin {
            RoleScope::Global
        } else {
            RoleScope::Organization
        }
    }

    /// Check whether this assignment covers the given property.
    ///
    /// An assignment with no property column is organization-wide and
    /// covers every property of its organization.
    pub fn covers_property(&self, property_id: PropertyId) -> bool {
        match self.property_id {
            None => true,
            Some(own) => own == property_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(property: Option<PropertyId>, unit: Option<UnitId>) -> RoleAssignment {
        let now = Utc::now();
        RoleAssignment {
            id: AssignmentId::new(),
            user_id: UserId::new(),
            organization_id: OrganizationId::new(),
            role: Role::Manager,
            property_id: property,
            unit_id: unit,
            permission_overrides: PermissionOverrides::new(),
            is_primary: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_scope_context_prefers_unit() {
        let both = assignment(Some(PropertyId::new()), Some(UnitId::new()));
        assert_eq!(both.scope_context(), RoleScope::Unit);

        let property_only = assignment(Some(PropertyId::new()), None);
        assert_eq!(property_only.scope_context(), RoleScope::Property);

        let org_wide = assignment(None, None);
        assert_eq!(org_wide.scope_context(), RoleScope::Organization);
    }

    #[test]
    fn test_covers_property() {
        let property = PropertyId::new();
        let scoped = assignment(Some(property), None);
        assert!(scoped.covers_property(property));
        assert!(!scoped.covers_property(PropertyId::new()));

        let org_wide = assignment(None, None);
        assert!(org_wide.covers_property(property));
    }
}
