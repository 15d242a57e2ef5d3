//! Organization membership handlers.

use axum::Json;
use axum::extract::{Path, State};

use haven_core::types::{AssignmentId, OrganizationId};

use crate::dto::request::ChangeRoleRequest;
use crate::dto::response::{ApiResponse, AssignmentResponse, MemberResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::guards;
use crate::state::AppState;

/// GET /api/organizations/{org_id}/members
pub async fn list(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(org_id): Path<OrganizationId>,
) -> Result<Json<ApiResponse<Vec<MemberResponse>>>, ApiError> {
    guards::require_same_org(&state, &auth, org_id).await?;

    let members = state.memberships.members(org_id).await?;
    Ok(Json(ApiResponse::ok(
        members.iter().map(MemberResponse::from).collect(),
    )))
}

/// PATCH /api/members/{assignment_id}/role
pub async fn change_role(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(assignment_id): Path<AssignmentId>,
    Json(req): Json<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<AssignmentResponse>>, ApiError> {
    let assignment = state
        .memberships
        .change_role(&auth, assignment_id, req.role, req.permission_overrides)
        .await?;

    Ok(Json(ApiResponse::ok(AssignmentResponse::from(&assignment))))
}

/// POST /api/members/{assignment_id}/primary
pub async fn set_primary(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(assignment_id): Path<AssignmentId>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.memberships.set_primary(&auth, assignment_id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Primary assignment updated",
    ))))
}

/// DELETE /api/members/{assignment_id}
pub async fn remove(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(assignment_id): Path<AssignmentId>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.memberships.remove_member(&auth, assignment_id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Member removed from organization",
    ))))
}
