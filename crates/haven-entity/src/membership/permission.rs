//! The closed permission catalog.
//!
//! Permissions form a fixed, enum-keyed set. A [`PermissionSet`] holds the
//! fully resolved boolean for every permission; sparse per-assignment
//! adjustments travel as [`PermissionOverrides`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Every permission the platform knows about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    /// Rename the organization, manage its settings and billing.
    ManageOrganization,
    /// Create, edit, and archive properties.
    ManageProperties,
    /// Create, edit, and archive units.
    ManageUnits,
    /// Create, amend, and terminate leases.
    ManageLeases,
    /// Issue, adjust, and void invoices.
    ManageInvoices,
    /// Triage and close maintenance requests.
    ManageMaintenance,
    /// Assign caretakers to properties.
    AssignCaretakers,
    /// Invite new members into the organization.
    InviteUsers,
    /// Remove members from the organization.
    RemoveUsers,
    /// Change members' roles and permission overrides.
    ManageRoles,
    /// View occupancy and financial reports.
    ViewReports,
    /// Export reports and raw data.
    ExportData,
    /// View property details.
    ViewProperties,
    /// View leases across the managed scope.
    ViewLeases,
    /// View invoices across the managed scope.
    ViewInvoices,
    /// File maintenance requests.
    CreateMaintenanceRequests,
    /// View one's own lease.
    ViewOwnLease,
    /// Pay one's own invoices.
    PayInvoices,
}

impl Permission {
    /// All permissions in catalog order.
    pub const ALL: [Permission; 18] = [
        Permission::ManageOrganization,
        Permission::ManageProperties,
        Permission::ManageUnits,
        Permission::ManageLeases,
        Permission::ManageInvoices,
        Permission::ManageMaintenance,
        Permission::AssignCaretakers,
        Permission::InviteUsers,
        Permission::RemoveUsers,
        Permission::ManageRoles,
        Permission::ViewReports,
        Permission::ExportData,
        Permission::ViewProperties,
        Permission::ViewLeases,
        Permission::ViewInvoices,
        Permission::CreateMaintenanceRequests,
        Permission::ViewOwnLease,
        Permission::PayInvoices,
    ];

    /// Return the permission's wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageOrganization => "manageOrganization",
            Self::ManageProperties => "manageProperties",
            Self::ManageUnits => "manageUnits",
            Self::ManageLeases => "manageLeases",
            Self::ManageInvoices => "manageInvoices",
            Self::ManageMaintenance => "manageMaintenance",
            Self::AssignCaretakers => "assignCaretakers",
            Self::InviteUsers => "inviteUsers",
            Self::RemoveUsers => "removeUsers",
            Self::ManageRoles => "manageRoles",
            Self::ViewReports => "viewReports",
            Self::ExportData => "exportData",
            Self::ViewProperties => "viewProperties",
            Self::ViewLeases => "viewLeases",
            Self::ViewInvoices => "viewInvoices",
            Self::CreateMaintenanceRequests => "createMaintenanceRequests",
            Self::ViewOwnLease => "viewOwnLease",
            Self::PayInvoices => "payInvoices",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sparse per-assignment permission adjustments.
///
/// An entry may grant (`true`) or revoke (`false`) a single permission on
/// top of the role defaults.
pub type PermissionOverrides = BTreeMap<Permission, bool>;

/// The full permission catalog resolved to booleans.
///
/// One field per permission keeps the set closed: adding a permission is a
/// compile-visible change, and there is no stringly-typed lookup to typo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionSet {
    pub manage_organization: bool,
    pub manage_properties: bool,
    pub manage_units: bool,
    pub manage_leases: bool,
    pub manage_invoices: bool,
    pub manage_maintenance: bool,
    pub assign_caretakers: bool,
    pub invite_users: bool,
    pub remove_users: bool,
    pub manage_roles: bool,
    pub view_reports: bool,
    pub export_data: bool,
    pub view_properties: bool,
    pub view_leases: bool,
    pub view_invoices: bool,
    pub create_maintenance_requests: bool,
    pub view_own_lease: bool,
    pub pay_invoices: bool,
}

impl PermissionSet {
    /// A set granting nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// A set granting everything.
    pub fn all() -> Self {
        let mut set = Self::default();
        for permission in Permission::ALL {
            set.set(permission, true);
        }
        set
    }

    /// Check whether a permission is granted.
    pub fn is_granted(&self, permission: Permission) -> bool {
        match permission {
            Permission::ManageOrganization => self.manage_organization,
            Permission::ManageProperties => self.manage_properties,
            Permission::ManageUnits => self.manage_units,
            Permission::ManageLeases => self.manage_leases,
            Permission::ManageInvoices => self.manage_invoices,
            Permission::ManageMaintenance => self.manage_maintenance,
            Permission::AssignCaretakers => self.assign_caretakers,
            Permission::InviteUsers => self.invite_users,
            Permission::RemoveUsers => self.remove_users,
            Permission::ManageRoles => self.manage_roles,
            Permission::ViewReports => self.view_reports,
            Permission::ExportData => self.export_data,
            Permission::ViewProperties => self.view_properties,
            Permission::ViewLeases => self.view_leases,
            Permission::ViewInvoices => self.view_invoices,
            Permission::CreateMaintenanceRequests => self.create_maintenance_requests,
            Permission::ViewOwnLease => self.view_own_lease,
            Permission::PayInvoices => self.pay_invoices,
        }
    }

    /// Grant or revoke a single permission.
    pub fn set(&mut self, permission: Permission, granted: bool) {
        match permission {
            Permission::ManageOrganization => self.manage_organization = granted,
            Permission::ManageProperties => self.manage_properties = granted,
            Permission::ManageUnits => self.manage_units = granted,
            Permission::ManageLeases => self.manage_leases = granted,
            Permission::ManageInvoices => self.manage_invoices = granted,
            Permission::ManageMaintenance => self.manage_maintenance = granted,
            Permission::AssignCaretakers => self.assign_caretakers = granted,
            Permission::InviteUsers => self.invite_users = granted,
            Permission::RemoveUsers => self.remove_users = granted,
            Permission::ManageRoles => self.manage_roles = granted,
            Permission::ViewReports => self.view_reports = granted,
            Permission::ExportData => self.export_data = granted,
            Permission::ViewProperties => self.view_properties = granted,
            Permission::ViewLeases => self.view_leases = granted,
            Permission::ViewInvoices => self.view_invoices = granted,
            Permission::CreateMaintenanceRequests => {
                self.create_maintenance_requests = granted
            }
            Permission::ViewOwnLease => self.view_own_lease = granted,
            Permission::PayInvoices => self.pay_invoices = granted,
        }
    }

    /// Grant several permissions at once.
    pub fn grant(mut self, permissions: &[Permission]) -> Self {
        for &permission in permissions {
            self.set(permission, true);
        }
        self
    }

    /// Every permission currently granted, in catalog order.
    pub fn granted(&self) -> Vec<Permission> {
        Permission::ALL
            .iter()
            .copied()
            .filter(|&p| self.is_granted(p))
            .collect()
    }
}
