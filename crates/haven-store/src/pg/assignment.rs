use async_trait::async_trait;
use chrono::{DateTime, Utc};

use haven_core::error::{AppError, ErrorKind};
use haven_core::result::AppResult;
use haven_core::types::{AssignmentId, OrganizationId, UserId};
use haven_entity::{PermissionOverrides, Role, RoleAssignment};

use super::PgStore;
use crate::traits::AssignmentStore;

#[async_trait]
impl AssignmentStore for PgStore {
    async fn insert_assignment(&self, assignment: &RoleAssignment) -> AppResult<()> {
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
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("role_assignments_scope_key") =>
            {
                AppError::conflict("User already holds this role assignment")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create role assignment", e),
        })?;

        Ok(())
    }

    async fn find_assignment(&self, id: AssignmentId) -> AppResult<Option<RoleAssignment>> {
        sqlx::query_as::<_, RoleAssignment>("SELECT * FROM role_assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find role assignment", e)
            })
    }

    async fn assignments_for_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        sqlx::query_as::<_, RoleAssignment>(
            "SELECT * FROM role_assignments WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list user assignments", e)
        })
    }

    async fn assignments_for_org(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<RoleAssignment>> {
        sqlx::query_as::<_, RoleAssignment>(
            "SELECT * FROM role_assignments WHERE organization_id = $1 ORDER BY created_at ASC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list organization members", e)
        })
    }

    async fn update_assignment_role(
        &self,
        id: AssignmentId,
        role: Role,
        overrides: Option<&PermissionOverrides>,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = match overrides {
            Some(overrides) => {
                sqlx::query(
                    r#"
                    UPDATE role_assignments
                    SET role = $2, permission_overrides = $3, updated_at = $4
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(role)
                .bind(sqlx::types::Json(overrides))
                .bind(at)
                .execute(&self.pool)
                .await
            }
            None => {
                sqlx::query("UPDATE role_assignments SET role = $2, updated_at = $3 WHERE id = $1")
                    .bind(id)
                    .bind(role)
                    .bind(at)
                    .execute(&self.pool)
                    .await
            }
        };

        result.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update assignment role", e)
        })?;

        Ok(())
    }

    async fn set_primary_assignment(
        &self,
        user_id: UserId,
        id: AssignmentId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query(
            r#"
            UPDATE role_assignments
            SET is_primary = FALSE, updated_at = $2
            WHERE user_id = $1 AND is_primary = TRUE
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to clear primary assignment", e)
        })?;

        sqlx::query(
            r#"
            UPDATE role_assignments
            SET is_primary = TRUE, updated_at = $3
            WHERE id = $2 AND user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(id)
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to set primary assignment", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit primary change", e)
        })?;

        Ok(())
    }

    async fn delete_assignment(&self, id: AssignmentId) -> AppResult<()> {
        sqlx::query("DELETE FROM role_assignments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete role assignment", e)
            })?;

        Ok(())
    }

    async fn count_org_admins(&self, organization_id: OrganizationId) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM role_assignments
            WHERE organization_id = $1 AND role IN ('admin', 'super_admin')
            "#,
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count organization admins", e)
        })
    }
}
