//! Route definitions for the Haven HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`. The
//! router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{delete, get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(invitation_routes())
        .merge(member_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Account endpoints: registration, login, tokens, passwords, sessions.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/auth/change-password",
            post(handlers::auth::change_password),
        )
        .route(
            "/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route("/auth/sessions", get(handlers::auth::sessions))
        .route(
            "/auth/sessions/{device_id}",
            delete(handlers::auth::revoke_device),
        )
}

/// Invitation lifecycle. Accept and decline are public: the emailed
/// token is the credential.
fn invitation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/invitations",
            post(handlers::invitation::create).get(handlers::invitation::list),
        )
        .route("/invitations/accept", post(handlers::invitation::accept))
        .route("/invitations/decline", post(handlers::invitation::decline))
        .route(
            "/invitations/{id}/resend",
            post(handlers::invitation::resend),
        )
        .route("/invitations/{id}", delete(handlers::invitation::revoke))
}

/// Membership administration within an organization.
fn member_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/members",
            get(handlers::member::list),
        )
        .route(
            "/members/{assignment_id}/role",
            patch(handlers::member::change_role),
        )
        .route(
            "/members/{assignment_id}/primary",
            post(handlers::member::set_primary),
        )
        .route("/members/{assignment_id}", delete(handlers::member::remove))
}

/// Health check endpoint (no auth required).
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Build CORS layer from configuration.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(cors_config.preflight_max_age());

    if cors_config.allows_any_origin() {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors
}
