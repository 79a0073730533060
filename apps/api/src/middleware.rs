use axum::body::{Body, to_bytes};
use axum::extract::{Extension, RawPathParams, Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use tessera_core::{AppError, UserIdentity};
use tessera_domain::EntityKind;
use tower_sessions::Session;

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

// Large ids are never legitimate; cap the buffered body when probing it.
const GUARD_BODY_LIMIT: usize = 64 * 1024;

/// Route-layer configuration for the entity ownership guard.
#[derive(Debug, Clone, Copy)]
pub struct EntityGuard {
    /// Entity kind the guarded routes operate on.
    pub kind: EntityKind,
    /// Name of the identifier in path params, query string or JSON body.
    pub parameter: &'static str,
}

pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Rejects requests referencing an entity outside the caller's organization.
///
/// The identifier is taken from the configured path parameter, then the query
/// string, then a JSON body field of the same name; a request carrying no
/// identifier passes through untouched. A foreign or absent entity produces
/// the same not-found rejection a direct lookup would.
pub async fn verify_entity_ownership(
    State(state): State<AppState>,
    Extension(guard): Extension<EntityGuard>,
    params: RawPathParams,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let actor = request
        .extensions()
        .get::<UserIdentity>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let mut entity_id = params
        .iter()
        .find(|(name, _)| *name == guard.parameter)
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty());

    if entity_id.is_none() {
        entity_id = query_parameter(request.uri().query(), guard.parameter);
    }

    let mut request = request;
    if entity_id.is_none() && accepts_json_body(request.method()) {
        let (parts, body) = request.into_parts();
        let bytes = to_bytes(body, GUARD_BODY_LIMIT).await.map_err(|error| {
            AppError::Validation(format!("failed to read request body: {error}"))
        })?;

        entity_id = serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|payload| {
                payload
                    .get(guard.parameter)
                    .and_then(|value| value.as_str())
                    .map(str::to_owned)
            })
            .filter(|value| !value.is_empty());

        request = Request::from_parts(parts, Body::from(bytes));
    }

    if let Some(entity_id) = entity_id {
        state
            .tenant_access_service
            .ensure_entity_access(&actor, guard.kind, &entity_id)
            .await?;
    }

    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if let Some(fetch_site) = headers.get("sec-fetch-site")
            && fetch_site == HeaderValue::from_static("cross-site")
        {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        let allowed_origin = state.frontend_url;
        let origin_is_allowed = origin == allowed_origin;
        let referer_is_allowed = referer.starts_with(&allowed_origin);

        if !origin_is_allowed && !referer_is_allowed {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn accepts_json_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn query_parameter(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key.as_ref() == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::query_parameter;

    #[test]
    fn query_parameter_finds_named_value() {
        assert_eq!(
            query_parameter(Some("page=2&risk_id=abc"), "risk_id"),
            Some("abc".to_owned())
        );
    }

    #[test]
    fn query_parameter_ignores_empty_values() {
        assert_eq!(query_parameter(Some("risk_id="), "risk_id"), None);
        assert_eq!(query_parameter(None, "risk_id"), None);
    }

    #[test]
    fn query_parameter_decodes_percent_encoding() {
        assert_eq!(
            query_parameter(
                Some("risk_id=0b1f8f1e%2D9d2c%2D4a5b%2D8c3d%2D1e2f3a4b5c6d"),
                "risk_id"
            ),
            Some("0b1f8f1e-9d2c-4a5b-8c3d-1e2f3a4b5c6d".to_owned())
        );
        assert_eq!(
            query_parameter(Some("name=two%20words&risk_id=abc"), "name"),
            Some("two words".to_owned())
        );
    }
}
