//! Liveness endpoint.

use axum::Json;

use crate::dto::response::{ApiResponse, HealthResponse};

/// GET /api/health
///
/// Answers without touching the database; a 200 means the process is up,
/// not that every dependency is healthy.
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
