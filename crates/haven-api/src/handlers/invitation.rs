//! Invitation handlers: create, list, accept, decline, resend, revoke.

use axum::Json;
use axum::extract::{Path, State};

use haven_core::types::{InvitationId, OrganizationId};
use haven_service::invitation::{AcceptInvitationInput, CreateInvitationInput};

use crate::dto::request::{
    AcceptInvitationRequest, CreateInvitationRequest, DeclineInvitationRequest,
};
use crate::dto::response::{ApiResponse, AuthResponse, InvitationResponse, MessageResponse};
use crate::dto::validate_payload;
use crate::error::ApiError;
use crate::extractors::{ClientMeta, CurrentUser};
use crate::state::AppState;

/// POST /api/organizations/{org_id}/invitations
pub async fn create(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(org_id): Path<OrganizationId>,
    Json(req): Json<CreateInvitationRequest>,
) -> Result<Json<ApiResponse<InvitationResponse>>, ApiError> {
    validate_payload(&req)?;

    let invitation = state
        .invitations
        .create(
            &auth,
            org_id,
            CreateInvitationInput {
                email: req.email,
                role: req.role,
                property_id: req.property_id,
                unit_id: req.unit_id,
                permission_overrides: req.permission_overrides,
            },
        )
        .await?;

    Ok(Json(ApiResponse::ok(InvitationResponse::from(&invitation))))
}

/// GET /api/organizations/{org_id}/invitations
pub async fn list(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(org_id): Path<OrganizationId>,
) -> Result<Json<ApiResponse<Vec<InvitationResponse>>>, ApiError> {
    let invitations = state.invitations.list(&auth, org_id).await?;
    Ok(Json(ApiResponse::ok(
        invitations.iter().map(InvitationResponse::from).collect(),
    )))
}

/// POST /api/invitations/accept
///
/// Public: the token in the body is the credential.
pub async fn accept(
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(req): Json<AcceptInvitationRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    validate_payload(&req)?;

    let session = state
        .invitations
        .accept(
            AcceptInvitationInput {
                token: req.token,
                password: req.password,
                first_name: req.first_name,
                last_name: req.last_name,
                phone: req.phone,
            },
            &meta.device_info(None),
        )
        .await?;

    Ok(Json(ApiResponse::ok(AuthResponse::from(&session))))
}

/// POST /api/invitations/decline
///
/// Public, like accept.
pub async fn decline(
    State(state): State<AppState>,
    Json(req): Json<DeclineInvitationRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate_payload(&req)?;

    state.invitations.decline(&req.token).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Invitation declined",
    ))))
}

/// POST /api/invitations/{id}/resend
pub async fn resend(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<InvitationId>,
) -> Result<Json<ApiResponse<InvitationResponse>>, ApiError> {
    let invitation = state.invitations.resend(&auth, id).await?;
    Ok(Json(ApiResponse::ok(InvitationResponse::from(&invitation))))
}

/// DELETE /api/invitations/{id}
pub async fn revoke(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(id): Path<InvitationId>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.invitations.revoke(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Invitation revoked",
    ))))
}
