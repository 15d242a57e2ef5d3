//! Shared authorization guards used across handlers.

use haven_auth::access::{AccessRequirement, ResourceRule};
use haven_auth::principal::Principal;
use haven_core::result::AppResult;
use haven_core::types::OrganizationId;
use haven_entity::ResourceKind;

use crate::state::AppState;

/// Requires the caller to belong to the organization in the path.
///
/// An organization id that does not exist surfaces as `NotFound`, not a
/// permission error.
pub async fn require_same_org(
    state: &AppState,
    principal: &Principal,
    organization_id: OrganizationId,
) -> AppResult<()> {
    let requirement = AccessRequirement::new().resource(
        ResourceRule::new(ResourceKind::Organization, organization_id.into_uuid())
            .same_organization(),
    );
    state.access.authorize(Some(principal), &requirement).await
}
