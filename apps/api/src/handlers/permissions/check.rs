use std::str::FromStr;

use axum::http::HeaderMap;
use tessera_core::AppError;
use tessera_domain::{Action, EntityKind, Resource};

use super::*;

use crate::middleware::EntityGuard;

/// Evaluates a permission check described by request headers.
///
/// The check target travels in `x-resource` and `x-action`; an optional
/// `x-entity-id` names a concrete instance, whose attributes are loaded
/// through the tenant guard before scope evaluation. A denial is a normal
/// `200` response with `allowed: false`.
pub async fn check_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
) -> ApiResult<Json<PermissionDecisionResponse>> {
    let resource = Resource::from_str(required_header(&headers, "x-resource")?)?;
    let action = Action::from_str(required_header(&headers, "x-action")?)?;

    let context = match optional_header(&headers, "x-entity-id") {
        Some(entity_id) => match EntityKind::for_resource(resource) {
            Some(kind) => Some(
                state
                    .tenant_access_service
                    .resource_context(&user, kind, entity_id)
                    .await?,
            ),
            None => None,
        },
        None => None,
    };

    let decision = state
        .permission_service
        .check_permission(
            user.organization_id(),
            user.subject(),
            resource,
            action,
            context.as_ref(),
        )
        .await?;

    Ok(Json(PermissionDecisionResponse::from(decision)))
}

pub async fn entity_context_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Extension(guard): Extension<EntityGuard>,
    Path(entity_id): Path<String>,
) -> ApiResult<Json<ResourceContextResponse>> {
    let context = state
        .tenant_access_service
        .resource_context(&user, guard.kind, entity_id.as_str())
        .await?;

    Ok(Json(ResourceContextResponse::from(context)))
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    optional_header(headers, name)
        .ok_or_else(|| AppError::Validation(format!("missing required header '{name}'")))
}

fn optional_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
