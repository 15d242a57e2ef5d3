//! Shorthand result alias.

use crate::error::AppError;

/// `Result` with the error slot fixed to [`AppError`].
pub type AppResult<T> = Result<T, AppError>;
