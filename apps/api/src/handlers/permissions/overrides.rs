use super::*;

use tessera_core::AppResult;

pub async fn get_user_overrides_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<OverrideResponse>>> {
    let overrides = state
        .group_admin_service
        .get_user_overrides(&user, user_id.as_str())
        .await?
        .into_iter()
        .map(OverrideResponse::from)
        .collect();

    Ok(Json(overrides))
}

pub async fn set_user_overrides_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<Vec<OverrideEntryRequest>>,
) -> ApiResult<Json<Vec<OverrideResponse>>> {
    let overrides = payload
        .into_iter()
        .map(|entry| entry.into_record(user_id.as_str()))
        .collect::<AppResult<Vec<_>>>()?;

    let stored = state
        .group_admin_service
        .set_user_overrides(&user, user_id.as_str(), overrides)
        .await?
        .into_iter()
        .map(OverrideResponse::from)
        .collect();

    Ok(Json(stored))
}

pub async fn user_permission_summary_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserPermissionSummaryResponse>> {
    let summary = state
        .group_admin_service
        .user_permission_summary(&user, user_id.as_str())
        .await?;

    Ok(Json(UserPermissionSummaryResponse::from(summary)))
}
