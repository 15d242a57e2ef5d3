use async_trait::async_trait;
use chrono::{DateTime, Utc};

use haven_core::error::{AppError, ErrorKind};
use haven_core::result::AppResult;
use haven_core::types::ResetTokenId;
use haven_entity::PasswordResetToken;

use super::PgStore;
use crate::traits::ResetTokenStore;

#[async_trait]
impl ResetTokenStore for PgStore {
    async fn insert_reset_token(&self, token: &PasswordResetToken) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (
                id, user_id, token_hash, expires_at, used_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.used_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to store reset token", e)
        })?;

        Ok(())
    }

    async fn find_reset_token_by_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<PasswordResetToken>> {
        sqlx::query_as::<_, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find reset token", e))
    }

    async fn consume_reset_token(
        &self,
        id: ResetTokenId,
        used_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = $2 WHERE id = $1 AND used_at IS NULL",
        )
        .bind(id)
        .bind(used_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to consume reset token", e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn purge_dead_reset_tokens(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM password_reset_tokens
            WHERE expires_at < $1 OR (used_at IS NOT NULL AND used_at < $1)
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to purge reset tokens", e)
        })?;

        Ok(result.rows_affected())
    }
}
