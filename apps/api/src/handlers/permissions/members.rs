use super::*;

pub async fn list_group_members_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
) -> ApiResult<Json<Vec<GroupMembershipResponse>>> {
    let members = state
        .group_admin_service
        .list_members(&user, group_id.as_str())
        .await?
        .into_iter()
        .map(GroupMembershipResponse::from)
        .collect();

    Ok(Json(members))
}

pub async fn add_group_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(group_id): Path<String>,
    Json(payload): Json<AddGroupMemberRequest>,
) -> ApiResult<(StatusCode, Json<GroupMembershipResponse>)> {
    let membership = state
        .group_admin_service
        .add_member(&user, group_id.as_str(), payload.user_id.as_str())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GroupMembershipResponse::from(membership)),
    ))
}

pub async fn remove_group_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((group_id, user_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .group_admin_service
        .remove_member(&user, group_id.as_str(), user_id.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
