//! Request and response shapes for the HTTP surface.

pub mod request;
pub mod response;

use haven_core::error::AppError;
use haven_core::result::AppResult;
use validator::Validate;

/// Runs derive-based validation and flattens failures into one message.
pub fn validate_payload<T: Validate>(payload: &T) -> AppResult<()> {
    payload.validate().map_err(|errors| {
        let detail = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |error| match &error.message {
                    Some(message) => format!("{field}: {message}"),
                    None => format!("{field}: invalid value"),
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::validation(detail)
    })
}
