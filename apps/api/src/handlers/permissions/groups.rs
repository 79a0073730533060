use super::*;

use tessera_application::{CreateGroupInput, UpdateGroupInput};
use tessera_core::AppResult;
use tessera_domain::PermissionGrant;

pub async fn list_groups_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<PermissionGroupResponse>>> {
    let groups = state
        .group_admin_service
        .list_groups(&user)
        .await?
        .into_iter()
        .map(PermissionGroupResponse::from)
        .collect();

    Ok(Json(groups))
}

pub async fn create_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreatePermissionGroupRequest>,
) -> ApiResult<(StatusCode, Json<PermissionGroupResponse>)> {
    let permissions = convert_grants(payload.permissions)?;

    let group = state
        .group_admin_service
        .create_group(
            &user,
            CreateGroupInput {
                name: payload.name,
                permissions,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PermissionGroupResponse::from(group))))
}

pub async fn update_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
    Json(payload): Json<UpdatePermissionGroupRequest>,
) -> ApiResult<Json<PermissionGroupResponse>> {
    let permissions = payload.permissions.map(convert_grants).transpose()?;

    let group = state
        .group_admin_service
        .update_group(
            &user,
            group_id.as_str(),
            UpdateGroupInput {
                name: payload.name,
                permissions,
            },
        )
        .await?;

    Ok(Json(PermissionGroupResponse::from(group)))
}

pub async fn delete_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .group_admin_service
        .delete_group(&user, group_id.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

fn convert_grants(requests: Vec<PermissionGrantRequest>) -> AppResult<Vec<PermissionGrant>> {
    requests
        .into_iter()
        .map(PermissionGrantRequest::into_grant)
        .collect()
}
