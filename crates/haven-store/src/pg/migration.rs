use sqlx::PgPool;

use haven_core::error::{AppError, ErrorKind};
use haven_core::result::AppResult;

/// Applies pending SQL migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to run migrations", e))?;

    tracing::info!("Database migrations complete");
    Ok(())
}
