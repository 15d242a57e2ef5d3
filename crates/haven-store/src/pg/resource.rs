use async_trait::async_trait;
use uuid::Uuid;

use haven_core::error::{AppError, ErrorKind};
use haven_core::result::AppResult;
use haven_core::types::{OrganizationId, PropertyId, UserId};
use haven_entity::{
    Invoice, Lease, MaintenanceRequest, Property, ResourceFacts, ResourceKind, Unit,
};

use super::PgStore;
use crate::traits::ResourceStore;

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn insert_property(&self, property: &Property) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO properties (id, organization_id, owner_user_id, name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(property.id)
        .bind(property.organization_id)
        .bind(property.owner_user_id)
        .bind(&property.name)
        .bind(property.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create property"))?;

        Ok(())
    }

    async fn insert_unit(&self, unit: &Unit) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO units (id, property_id, organization_id, label, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(unit.id)
        .bind(unit.property_id)
        .bind(unit.organization_id)
        .bind(&unit.label)
        .bind(unit.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create unit"))?;

        Ok(())
    }

    async fn insert_lease(&self, lease: &Lease) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leases (
                id, organization_id, property_id, unit_id, tenant_user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(lease.id)
        .bind(lease.organization_id)
        .bind(lease.property_id)
        .bind(lease.unit_id)
        .bind(lease.tenant_user_id)
        .bind(lease.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create lease"))?;

        Ok(())
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, organization_id, property_id, recipient_user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.organization_id)
        .bind(invoice.property_id)
        .bind(invoice.recipient_user_id)
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create invoice"))?;

        Ok(())
    }

    async fn insert_maintenance_request(&self, request: &MaintenanceRequest) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO maintenance_requests (
                id, organization_id, property_id, unit_id, created_by_user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(request.id)
        .bind(request.organization_id)
        .bind(request.property_id)
        .bind(request.unit_id)
        .bind(request.created_by_user_id)
        .bind(request.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create maintenance request"))?;

        Ok(())
    }

    async fn resource_facts(
        &self,
        kind: ResourceKind,
        id: Uuid,
    ) -> AppResult<Option<ResourceFacts>> {
        let facts = match kind {
            ResourceKind::Organization => {
                sqlx::query_as::<_, (OrganizationId,)>("SELECT id FROM organizations WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_error("Failed to load organization facts"))?
                    .map(|(org_id,)| ResourceFacts::organization(org_id))
            }
            ResourceKind::Property => sqlx::query_as::<_, (OrganizationId, Option<UserId>)>(
                "SELECT organization_id, owner_user_id FROM properties WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load property facts"))?
            .map(|(org_id, owner)| ResourceFacts {
                kind,
                organization_ids: vec![org_id],
                property_id: Some(PropertyId::from(id)),
                owner_user_id: owner,
            }),
            ResourceKind::Unit => {
                sqlx::query_as::<_, (OrganizationId, PropertyId, Option<UserId>)>(
                    r#"
                    SELECT u.organization_id, u.property_id, p.owner_user_id
                    FROM units u
                    JOIN properties p ON p.id = u.property_id
                    WHERE u.id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to load unit facts"))?
                .map(|(org_id, property_id, owner)| ResourceFacts {
                    kind,
                    organization_ids: vec![org_id],
                    property_id: Some(property_id),
                    owner_user_id: owner,
                })
            }
            ResourceKind::Lease => sqlx::query_as::<_, (OrganizationId, PropertyId, UserId)>(
                "SELECT organization_id, property_id, tenant_user_id FROM leases WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to load lease facts"))?
            .map(|(org_id, property_id, tenant)| ResourceFacts {
                kind,
                organization_ids: vec![org_id],
                property_id: Some(property_id),
                owner_user_id: Some(tenant),
            }),
            ResourceKind::Invoice => {
                sqlx::query_as::<_, (OrganizationId, Option<PropertyId>, UserId)>(
                    r#"
                    SELECT organization_id, property_id, recipient_user_id
                    FROM invoices WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to load invoice facts"))?
                .map(|(org_id, property_id, recipient)| ResourceFacts {
                    kind,
                    organization_ids: vec![org_id],
                    property_id,
                    owner_user_id: Some(recipient),
                })
            }
            ResourceKind::MaintenanceRequest => {
                sqlx::query_as::<_, (OrganizationId, PropertyId, UserId)>(
                    r#"
                    SELECT organization_id, property_id, created_by_user_id
                    FROM maintenance_requests WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to load maintenance request facts"))?
                .map(|(org_id, property_id, creator)| ResourceFacts {
                    kind,
                    organization_ids: vec![org_id],
                    property_id: Some(property_id),
                    owner_user_id: Some(creator),
                })
            }
            ResourceKind::User => {
                let exists =
                    sqlx::query_as::<_, (UserId,)>("SELECT id FROM users WHERE id = $1")
                        .bind(id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(db_error("Failed to load user facts"))?;

                match exists {
                    None => None,
                    Some((user_id,)) => {
                        let organization_ids = sqlx::query_as::<_, (OrganizationId,)>(
                            "SELECT DISTINCT organization_id FROM role_assignments WHERE user_id = $1",
                        )
                        .bind(user_id)
                        .fetch_all(&self.pool)
                        .await
                        .map_err(db_error("Failed to load user memberships"))?
                        .into_iter()
                        .map(|(org_id,)| org_id)
                        .collect();

                        Some(ResourceFacts {
                            kind,
                            organization_ids,
                            property_id: None,
                            owner_user_id: Some(user_id),
                        })
                    }
                }
            }
        };

        Ok(facts)
    }
}
