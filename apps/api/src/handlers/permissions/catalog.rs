use super::*;

use tessera_domain::Resource;

pub async fn available_permissions_handler() -> Json<Vec<AvailablePermissionResponse>> {
    let catalog = Resource::all()
        .iter()
        .map(|resource| AvailablePermissionResponse {
            resource: resource.as_str().to_owned(),
            actions: resource
                .supported_actions()
                .iter()
                .map(|action| action.as_str().to_owned())
                .collect(),
        })
        .collect();

    Json(catalog)
}

pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<EffectivePermissionResponse>>> {
    let effective = state
        .permission_service
        .effective_permissions(user.organization_id(), user.subject())
        .await?
        .into_iter()
        .map(EffectivePermissionResponse::from)
        .collect();

    Ok(Json(effective))
}
