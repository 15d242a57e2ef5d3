//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use haven_core::error::{AppError, ErrorKind};

/// Wrapper that lets handlers return domain errors with `?`.
///
/// Storage-level kinds (`Database`, `Configuration`, `Serialization`,
/// `Internal`) are reported as a generic 500; their messages never reach
/// the client.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(error: E) -> Self {
        ApiError(error.into())
    }
}

/// Error half of the response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.0;
        let status = match error.kind {
            ErrorKind::AuthenticationRequired | ErrorKind::InvalidOrExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            ErrorKind::AccountDeactivated
            | ErrorKind::EmailNotVerified
            | ErrorKind::InsufficientPermissions => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Serialization
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(kind = %error.kind, error = %error, "Internal server error");
            "An internal error occurred".to_string()
        } else {
            error.message.clone()
        };

        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code: error.kind.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
