use tessera_core::{AppError, OrganizationId};

use super::*;

/// Provisions the default permission groups for an organization.
///
/// Intended for organization bootstrap, so the caller authenticates with the
/// shared provisioning token instead of a session. The call is idempotent and
/// never touches a same-named group an administrator has edited.
pub async fn seed_default_groups_handler(
    State(state): State<AppState>,
    Json(payload): Json<SeedDefaultGroupsRequest>,
) -> ApiResult<Json<SeedDefaultGroupsResponse>> {
    if payload.token != state.provisioning_token {
        return Err(AppError::Unauthorized("invalid provisioning token".to_owned()).into());
    }

    let organization_id = uuid::Uuid::parse_str(payload.organization_id.as_str())
        .map(OrganizationId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid organization id: {error}")))?;

    let created = state
        .group_admin_service
        .seed_default_groups(organization_id)
        .await?;

    Ok(Json(SeedDefaultGroupsResponse { created }))
}
