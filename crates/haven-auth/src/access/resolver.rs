//! Evaluates access requirements against a principal.

use std::sync::Arc;

use haven_core::error::AppError;
use haven_core::result::AppResult;
use haven_store::Store;

use crate::principal::Principal;

use super::requirement::AccessRequirement;

/// Decides whether a principal satisfies an access requirement.
#[derive(Clone)]
pub struct AccessResolver {
    store: Arc<dyn Store>,
}

impl AccessResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Authorizes the caller or returns the matching error.
    ///
    /// Checks run cheapest first: roles, then the custom predicate, then
    /// resource relationships (the only step that touches the store). A
    /// referenced resource that does not exist is `NotFound` regardless of
    /// which grants the rule enables.
    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        requirement: &AccessRequirement,
    ) -> AppResult<()> {
        let principal = principal
            .ok_or_else(|| AppError::authentication_required("Authentication required"))?;

        if !requirement.allowed_roles.is_empty()
            && principal.holds_any_role(&requirement.allowed_roles)
        {
            return Ok(());
        }

        if let Some(check) = &requirement.custom_check {
            if check(principal) {
                return Ok(());
            }
        }

        if let Some(rule) = &requirement.resource {
            let facts = self
                .store
                .resource_facts(rule.target.kind, rule.target.id)
                .await?
                .ok_or_else(|| AppError::not_found("Resource not found"))?;

            if rule.allow_owner && facts.owner_user_id == Some(principal.user_id) {
                return Ok(());
            }

            if rule.allow_property_manager
                && facts
                    .organization_ids
                    .iter()
                    .any(|org| principal.manages_property(*org, facts.property_id))
            {
                return Ok(());
            }

            if rule.allow_same_organization
                && facts
                    .organization_ids
                    .iter()
                    .any(|org| principal.is_member_of(*org))
            {
                return Ok(());
            }
        }

        Err(AppError::insufficient_permissions(
            "You do not have permission to perform this action",
        ))
    }
}
