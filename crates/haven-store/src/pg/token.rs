use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use haven_core::error::{AppError, ErrorKind};
use haven_core::result::AppResult;
use haven_core::types::{TokenId, UserId};
use haven_entity::RefreshTokenRecord;

use super::PgStore;
use crate::traits::RefreshTokenStore;

fn insert_token_query(
    token: &RefreshTokenRecord,
) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (
            id, user_id, token_hash, family_id, device_id, user_agent,
            ip_address, expires_at, is_revoked, revoked_at, replaced_by,
            last_used_at, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(token.id)
    .bind(token.user_id)
    .bind(&token.token_hash)
    .bind(token.family_id)
    .bind(&token.device_id)
    .bind(&token.user_agent)
    .bind(&token.ip_address)
    .bind(token.expires_at)
    .bind(token.is_revoked)
    .bind(token.revoked_at)
    .bind(token.replaced_by)
    .bind(token.last_used_at)
    .bind(token.created_at)
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn insert_refresh_token(&self, token: &RefreshTokenRecord) -> AppResult<()> {
        insert_token_query(token)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to store refresh token", e)
            })?;

        Ok(())
    }

    async fn find_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT * FROM refresh_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find refresh token", e))
    }

    async fn rotate_refresh_token(
        &self,
        old_id: TokenId,
        revoked_at: DateTime<Utc>,
        replacement: &RefreshTokenRecord,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = $2, replaced_by = $3, last_used_at = $2
            WHERE id = $1 AND is_revoked = FALSE
            "#,
        )
        .bind(old_id)
        .bind(revoked_at)
        .bind(replacement.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke rotated token", e)
        })?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back rotation", e)
            })?;
            return Ok(false);
        }

        insert_token_query(replacement)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to store replacement token", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit token rotation", e)
        })?;

        Ok(true)
    }

    async fn revoke_refresh_token(&self, id: TokenId, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = $2
            WHERE id = $1 AND is_revoked = FALSE
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke refresh token", e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_token_family(&self, family_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = $2
            WHERE family_id = $1 AND is_revoked = FALSE
            "#,
        )
        .bind(family_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke token family", e)
        })?;

        Ok(result.rows_affected())
    }

    async fn revoke_tokens_for_user(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = $2
            WHERE user_id = $1 AND is_revoked = FALSE
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke user tokens", e)
        })?;

        Ok(result.rows_affected())
    }

    async fn revoke_tokens_for_device(
        &self,
        user_id: UserId,
        device_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, revoked_at = $3
            WHERE user_id = $1 AND device_id = $2 AND is_revoked = FALSE
            "#,
        )
        .bind(user_id)
        .bind(device_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke device tokens", e)
        })?;

        Ok(result.rows_affected())
    }

    async fn active_refresh_tokens(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<RefreshTokenRecord>> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT * FROM refresh_tokens
            WHERE user_id = $1 AND is_revoked = FALSE AND expires_at > $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list active sessions", e)
        })
    }

    async fn purge_dead_refresh_tokens(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE expires_at < $1 OR (is_revoked = TRUE AND revoked_at < $1)
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to purge refresh tokens", e)
        })?;

        Ok(result.rows_affected())
    }
}
