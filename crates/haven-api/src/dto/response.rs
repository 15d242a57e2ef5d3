//! Response DTOs.
//!
//! Everything that leaves the API goes through these shapes; entity
//! structs never serialize directly onto the wire. Token hashes and
//! invitation tokens stay out of responses.

use chrono::{DateTime, Utc};
use serde::Serialize;

use haven_auth::principal::{Membership, Principal};
use haven_core::types::{
    AssignmentId, InvitationId, OrganizationId, PropertyId, TokenId, UnitId, UserId,
};
use haven_entity::{
    Invitation, InvitationStatus, Permission, RefreshTokenRecord, Role, RoleAssignment, RoleScope,
    User,
};
use haven_service::account::AuthSession;
use haven_service::membership::MemberRecord;

/// Success envelope for every API response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            email_verified: user.email_verified,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Body returned by register, login, refresh, and invitation acceptance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    /// Opaque refresh token; shown exactly once.
    pub refresh_token: String,
}

impl From<&AuthSession> for AuthResponse {
    fn from(session: &AuthSession) -> Self {
        Self {
            user: UserResponse::from(&session.user),
            access_token: session.tokens.access_token.clone(),
            access_expires_at: session.tokens.access_expires_at,
            refresh_token: session.tokens.refresh_token.clone(),
        }
    }
}

/// One membership of the authenticated caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub assignment_id: AssignmentId,
    pub organization_id: OrganizationId,
    pub role: Role,
    pub scope: RoleScope,
    pub property_id: Option<PropertyId>,
    pub unit_id: Option<UnitId>,
    pub is_primary: bool,
    pub permissions: Vec<Permission>,
}

impl From<&Membership> for MembershipResponse {
    fn from(membership: &Membership) -> Self {
        let assignment = &membership.assignment;
        Self {
            assignment_id: assignment.id,
            organization_id: assignment.organization_id,
            role: assignment.role,
            scope: assignment.scope_context(),
            property_id: assignment.property_id,
            unit_id: assignment.unit_id,
            is_primary: assignment.is_primary,
            permissions: membership.permissions.granted(),
        }
    }
}

/// The authenticated caller: identity plus every membership.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: UserResponse,
    pub organization_id: Option<OrganizationId>,
    pub memberships: Vec<MembershipResponse>,
}

impl MeResponse {
    pub fn from_principal(principal: &Principal, user: &User) -> Self {
        Self {
            user: UserResponse::from(user),
            organization_id: principal.organization_id,
            memberships: principal
                .memberships
                .iter()
                .map(MembershipResponse::from)
                .collect(),
        }
    }
}

/// One active refresh session; the token itself is never echoed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: TokenId,
    pub device_id: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl From<&RefreshTokenRecord> for SessionResponse {
    fn from(record: &RefreshTokenRecord) -> Self {
        Self {
            id: record.id,
            device_id: record.device_id.clone(),
            user_agent: record.user_agent.clone(),
            ip_address: record.ip_address.clone(),
            created_at: record.created_at,
            last_used_at: record.last_used_at,
            expires_at: record.expires_at,
        }
    }
}

/// Public view of an invitation. The acceptance token only ever travels
/// in the invitation email.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub id: InvitationId,
    pub organization_id: OrganizationId,
    pub email: String,
    pub role: Role,
    pub property_id: Option<PropertyId>,
    pub unit_id: Option<UnitId>,
    pub status: InvitationStatus,
    pub invited_by: UserId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Invitation> for InvitationResponse {
    fn from(invitation: &Invitation) -> Self {
        Self {
            id: invitation.id,
            organization_id: invitation.organization_id,
            email: invitation.email.clone(),
            role: invitation.role,
            property_id: invitation.property_id,
            unit_id: invitation.unit_id,
            status: invitation.status,
            invited_by: invitation.invited_by,
            expires_at: invitation.expires_at,
            created_at: invitation.created_at,
        }
    }
}

/// A role assignment after an update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub id: AssignmentId,
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub role: Role,
    pub property_id: Option<PropertyId>,
    pub unit_id: Option<UnitId>,
    pub is_primary: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&RoleAssignment> for AssignmentResponse {
    fn from(assignment: &RoleAssignment) -> Self {
        Self {
            id: assignment.id,
            user_id: assignment.user_id,
            organization_id: assignment.organization_id,
            role: assignment.role,
            property_id: assignment.property_id,
            unit_id: assignment.unit_id,
            is_primary: assignment.is_primary,
            updated_at: assignment.updated_at,
        }
    }
}

/// One organization member.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub assignment_id: AssignmentId,
    pub user: UserResponse,
    pub role: Role,
    pub property_id: Option<PropertyId>,
    pub unit_id: Option<UnitId>,
    pub is_primary: bool,
    pub joined_at: DateTime<Utc>,
}

impl From<&MemberRecord> for MemberResponse {
    fn from(member: &MemberRecord) -> Self {
        Self {
            assignment_id: member.assignment.id,
            user: UserResponse::from(&member.user),
            role: member.assignment.role,
            property_id: member.assignment.property_id,
            unit_id: member.assignment.unit_id,
            is_primary: member.assignment.is_primary,
            joined_at: member.assignment.created_at,
        }
    }
}
