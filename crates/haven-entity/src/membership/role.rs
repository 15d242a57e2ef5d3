//! Role and scope enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles available in the platform, ordered by privilege level.
///
/// Levels run from tenant (50) to superAdmin (100); comparisons use the
/// numeric level, never the enum order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "snake_case")]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Occupies a unit under a lease.
    Tenant,
    /// Performs maintenance on a property.
    Caretaker,
    /// Runs day-to-day operations of one or more properties.
    Manager,
    /// Owns properties within an organization.
    PropertyOwner,
    /// Administers an organization.
    Admin,
    /// Platform-wide administrator.
    SuperAdmin,
}

impl Role {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Tenant => 50,
            Self::Caretaker => 60,
            Self::Manager => 70,
            Self::PropertyOwner => 80,
            Self::Admin => 90,
            Self::SuperAdmin => 100,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: Role) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Check if this role administers an organization or the platform.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }

    /// Check if this role manages properties (manager or higher).
    pub fn is_manager_or_above(&self) -> bool {
        self.has_at_least(Self::Manager)
    }

    /// Return the role's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Caretaker => "caretaker",
            Self::Manager => "manager",
            Self::PropertyOwner => "propertyOwner",
            Self::Admin => "admin",
            Self::SuperAdmin => "superAdmin",
        }
    }

    /// All roles, lowest privilege first.
    pub const ALL: [Role; 6] = [
        Role::Tenant,
        Role::Caretaker,
        Role::Manager,
        Role::PropertyOwner,
        Role::Admin,
        Role::SuperAdmin,
    ];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = haven_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tenant" => Ok(Self::Tenant),
            "caretaker" => Ok(Self::Caretaker),
            "manager" => Ok(Self::Manager),
            "propertyOwner" => Ok(Self::PropertyOwner),
            "admin" => Ok(Self::Admin),
            "superAdmin" => Ok(Self::SuperAdmin),
            _ => Err(haven_core::AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: tenant, caretaker, manager, \
                 propertyOwner, admin, superAdmin"
            ))),
        }
    }
}

/// The breadth of authority a role assignment carries.
///
/// Widths are strictly ordered: unit < property < organization < global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleScope {
    /// A single unit within a property.
    Unit,
    /// A single property and its units.
    Property,
    /// Everything belonging to one organization.
    Organization,
    /// The entire platform.
    Global,
}

impl RoleScope {
    /// Return the scope width (wider = larger number).
    pub fn width(&self) -> u8 {
        match self {
            Self::Unit => 0,
            Self::Property => 1,
            Self::Organization => 2,
            Self::Global => 3,
        }
    }

    /// Check if this scope is at least as wide as the other.
    pub fn at_least(&self, other: RoleScope) -> bool {
        self.width() >= other.width()
    }

    /// Return the scope's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Property => "property",
            Self::Organization => "organization",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
