//! `CurrentUser` extractor: bearer token in, authenticated principal out.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use haven_auth::principal::Principal;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, available to any handler that lists it.
///
/// Extraction runs the full authentication gate: token decode, account
/// status checks, and membership resolution. Routes without this
/// extractor stay public.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl std::ops::Deref for CurrentUser {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let device_id = parts
            .headers
            .get("x-device-id")
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        let principal = state.gate.authenticate(bearer, device_id).await?;
        Ok(CurrentUser(principal))
    }
}
