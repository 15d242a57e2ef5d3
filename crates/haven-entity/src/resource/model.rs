//! Resource records and the relationship facts derived from them.
//!
//! Haven is the authorization engine of the platform; these records carry
//! only the columns that decide who owns a record, which property it sits
//! under, and which organization it belongs to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use haven_core::types::{
    InvoiceId, LeaseId, MaintenanceRequestId, OrganizationId, PropertyId, UnitId, UserId,
};

/// Kinds of records an access requirement can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Organization,
    Property,
    Unit,
    Lease,
    Invoice,
    MaintenanceRequest,
    User,
}

/// A building or complex owned within an organization.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Property {
    /// Unique property identifier.
    pub id: PropertyId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// The propertyOwner member who owns this building (if recorded).
    pub owner_user_id: Option<UserId>,
    /// Display name.
    pub name: String,
    /// When the property was created.
    pub created_at: DateTime<Utc>,
}

/// A rentable unit within a property.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Unit {
    /// Unique unit identifier.
    pub id: UnitId,
    /// The property this unit belongs to.
    pub property_id: PropertyId,
    /// Owning organization (denormalized from the property).
    pub organization_id: OrganizationId,
    /// Unit label, e.g. "3B".
    pub label: String,
    /// When the unit was created.
    pub created_at: DateTime<Utc>,
}

/// A tenancy agreement binding a tenant to a unit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lease {
    /// Unique lease identifier.
    pub id: LeaseId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// The property the leased unit sits under.
    pub property_id: PropertyId,
    /// The leased unit.
    pub unit_id: UnitId,
    /// The tenant on the lease; its owner in access terms.
    pub tenant_user_id: UserId,
    /// When the lease was created.
    pub created_at: DateTime<Utc>,
}

/// A bill issued to a member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    /// Unique invoice identifier.
    pub id: InvoiceId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// The property the charge relates to, when any.
    pub property_id: Option<PropertyId>,
    /// The member billed; its owner in access terms.
    pub recipient_user_id: UserId,
    /// When the invoice was created.
    pub created_at: DateTime<Utc>,
}

/// A reported defect or work order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaintenanceRequest {
    /// Unique request identifier.
    pub id: MaintenanceRequestId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// The property the defect was reported on.
    pub property_id: PropertyId,
    /// The unit the defect was reported in, when any.
    pub unit_id: Option<UnitId>,
    /// The reporter; its owner in access terms.
    pub created_by_user_id: UserId,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
}

/// The relationship facts the access resolver needs about one resource.
///
/// For most kinds `organization_ids` holds a single entry; for a `User`
/// resource it holds every organization the user is a member of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFacts {
    /// What kind of record these facts describe.
    pub kind: ResourceKind,
    /// Organizations the resource belongs to.
    pub organization_ids: Vec<OrganizationId>,
    /// The property the resource sits under, when any.
    pub property_id: Option<PropertyId>,
    /// The user who owns the resource in the access-control sense.
    pub owner_user_id: Option<UserId>,
}

impl ResourceFacts {
    /// Facts for a resource identified only by its organization.
    pub fn organization(id: OrganizationId) -> Self {
        Self {
            kind: ResourceKind::Organization,
            organization_ids: vec![id],
            property_id: None,
            owner_user_id: None,
        }
    }
}

/// A `(kind, id)` pair naming one resource. The id is untyped because the
/// kind already disambiguates which table it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRef {
    /// What kind of record is referenced.
    pub kind: ResourceKind,
    /// The record's identifier.
    pub id: Uuid,
}

impl ResourceRef {
    /// Reference a resource by kind and raw id.
    pub fn new(kind: ResourceKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}
