//! Account handlers: register, login, token lifecycle, password flows.

use axum::Json;
use axum::extract::{Path, State};

use haven_core::error::AppError;
use haven_service::account::RegisterInput;
use haven_store::Store;

use crate::dto::request::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LogoutRequest, RefreshRequest,
    RegisterRequest, ResetPasswordRequest,
};
use crate::dto::response::{
    ApiResponse, AuthResponse, MeResponse, MessageResponse, SessionResponse,
};
use crate::dto::validate_payload;
use crate::error::ApiError;
use crate::extractors::{ClientMeta, CurrentUser};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    validate_payload(&req)?;

    let session = state
        .accounts
        .register(
            RegisterInput {
                organization_name: req.organization_name,
                email: req.email,
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

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    validate_payload(&req)?;

    let session = state
        .accounts
        .login(&req.email, &req.password, &meta.device_info(req.device_id))
        .await?;

    Ok(Json(ApiResponse::ok(AuthResponse::from(&session))))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    meta: ClientMeta,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    validate_payload(&req)?;

    let session = state
        .accounts
        .refresh(&req.refresh_token, &meta.device_info(req.device_id))
        .await?;

    Ok(Json(ApiResponse::ok(AuthResponse::from(&session))))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.accounts.logout(&req.refresh_token).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Logged out successfully",
    ))))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: CurrentUser,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let user = state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(ApiResponse::ok(MeResponse::from_principal(
        &auth, &user,
    ))))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate_payload(&req)?;

    state
        .accounts
        .change_password(&auth, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Password changed. Please sign in again.",
    ))))
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate_payload(&req)?;

    state.accounts.forgot_password(&req.email).await?;

    // Same body whether or not the account exists.
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "If that email is registered, a reset link has been sent",
    ))))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate_payload(&req)?;

    state
        .accounts
        .reset_password(&req.token, &req.new_password)
        .await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Password has been reset. Please sign in.",
    ))))
}

/// GET /api/auth/sessions
pub async fn sessions(
    State(state): State<AppState>,
    auth: CurrentUser,
) -> Result<Json<ApiResponse<Vec<SessionResponse>>>, ApiError> {
    let sessions = state.accounts.sessions(&auth).await?;
    Ok(Json(ApiResponse::ok(
        sessions.iter().map(SessionResponse::from).collect(),
    )))
}

/// DELETE /api/auth/sessions/{device_id}
pub async fn revoke_device(
    State(state): State<AppState>,
    auth: CurrentUser,
    Path(device_id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let revoked = state.accounts.revoke_device(&auth, &device_id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(format!(
        "Revoked {revoked} session(s)"
    )))))
}
