use async_trait::async_trait;

use haven_core::error::{AppError, ErrorKind};
use haven_core::result::AppResult;
use haven_core::types::OrganizationId;
use haven_entity::{Organization, RoleAssignment, User};

use super::PgStore;
use crate::traits::OrganizationStore;

#[async_trait]
impl OrganizationStore for PgStore {
    async fn insert_organization(&self, organization: &Organization) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO organizations (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create organization", e))?;

        Ok(())
    }

    async fn find_organization(&self, id: OrganizationId) -> AppResult<Option<Organization>> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find organization", e)
            })
    }

    async fn register_organization(
        &self,
        organization: &Organization,
        user: &User,
        assignment: &RoleAssignment,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query(
            "INSERT INTO organizations (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create organization", e))?;

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
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("users_email_key") => {
                AppError::conflict("An account with this email already exists")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })?;

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
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create role assignment", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit registration", e)
        })?;

        Ok(())
    }
}
