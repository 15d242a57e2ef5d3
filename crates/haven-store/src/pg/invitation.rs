use async_trait::async_trait;
use chrono::{DateTime, Utc};

use haven_core::error::{AppError, ErrorKind};
use haven_core::result::AppResult;
use haven_core::types::{InvitationId, OrganizationId, UserId};
use haven_entity::{Invitation, InvitationStatus, RoleAssignment, User};

use super::PgStore;
use crate::traits::InvitationStore;

fn map_invitation_insert_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err)
            if db_err.constraint() == Some("invitations_pending_email_idx") =>
        {
            AppError::conflict("A pending invitation already exists for this email")
        }
        sqlx::Error::Database(ref db_err)
            if db_err.constraint() == Some("invitations_token_key") =>
        {
            AppError::conflict("Invitation token collision")
        }
        _ => AppError::with_source(ErrorKind::Database, "Failed to create invitation", e),
    }
}

#[async_trait]
impl InvitationStore for PgStore {
    async fn insert_invitation(&self, invitation: &Invitation) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invitations (
                id, organization_id, email, role, property_id, unit_id,
                permission_overrides, invited_by, token, status,
                expires_at, accepted_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(invitation.id)
        .bind(invitation.organization_id)
        .bind(&invitation.email)
        .bind(invitation.role)
        .bind(invitation.property_id)
        .bind(invitation.unit_id)
        .bind(sqlx::types::Json(&invitation.permission_overrides))
        .bind(invitation.invited_by)
        .bind(&invitation.token)
        .bind(invitation.status)
        .bind(invitation.expires_at)
        .bind(invitation.accepted_at)
        .bind(invitation.created_at)
        .bind(invitation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_invitation_insert_error)?;

        Ok(())
    }

    async fn find_invitation(&self, id: InvitationId) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find invitation", e))
    }

    async fn find_invitation_by_token(&self, token: &str) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find invitation by token", e)
            })
    }

    async fn pending_invitation_for(
        &self,
        organization_id: OrganizationId,
        email: &str,
    ) -> AppResult<Option<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT * FROM invitations
            WHERE organization_id = $1 AND email = $2 AND status = 'pending'
            "#,
        )
        .bind(organization_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find pending invitation", e)
        })
    }

    async fn invitations_for_org(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Invitation>> {
        sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations WHERE organization_id = $1 ORDER BY created_at DESC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list invitations", e))
    }

    async fn transition_invitation(
        &self,
        id: InvitationId,
        from: InvitationStatus,
        to: InvitationStatus,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE invitations SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to transition invitation", e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn refresh_invitation_token(
        &self,
        id: InvitationId,
        token: &str,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET token = $2, expires_at = $3, updated_at = $4
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to refresh invitation token", e)
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn apply_acceptance(
        &self,
        id: InvitationId,
        accepted_at: DateTime<Utc>,
        new_user: Option<&User>,
        verify_user: Option<UserId>,
        assignment: &RoleAssignment,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let accepted = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'accepted', accepted_at = $2, updated_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(accepted_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to accept invitation", e)
        })?;

        if accepted.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back acceptance", e)
            })?;
            return Ok(false);
        }

        if let Some(user) = new_user {
            sqlx::query(
                r#"
                INSERT INTO users (
                    id, email, password_hash, first_name, last_name, phone,
                    is_active, email_verified, failed_login_attempts,
                    locked_until, last_login_at, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.phone)
            .bind(user.is_active)
            .bind(user.email_verified)
            .bind(user.failed_login_attempts)
            .bind(user.locked_until)
            .bind(user.last_login_at)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err)
                    if db_err.constraint() == Some("users_email_key") =>
                {
                    AppError::conflict("An account with this email already exists")
                }
                _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
            })?;
        }

        if let Some(user_id) = verify_user {
            sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = $2 WHERE id = $1")
                .bind(user_id)
                .bind(accepted_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to mark email verified", e)
                })?;
        }

        sqlx::query(
            r#"
            INSERT INTO role_assignments (
                id, user_id, organization_id, role, property_id, unit_id,
                permission_overrides, is_primary, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(assignment.id)
        .bind(assignment.user_id)
        .bind(assignment.organization_id)
        .bind(assignment.role)
        .bind(assignment.property_id)
        .bind(assignment.unit_id)
        .bind(sqlx::types::Json(&assignment.permission_overrides))
        .bind(assignment.is_primary)
        .bind(assignment.created_at)
        .bind(assignment.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("role_assignments_scope_key") =>
            {
                AppError::conflict("User already holds this role assignment")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create role assignment", e),
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit acceptance", e)
        })?;

        Ok(true)
    }

    async fn mark_expired_invitations(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'expired', updated_at = $1
            WHERE status = 'pending' AND expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to expire invitations", e)
        })?;

        Ok(result.rows_affected())
    }
}
