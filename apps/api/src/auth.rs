use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use tessera_core::{AppError, OrganizationId, UserIdentity};
use tower_sessions::Session;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Session key holding the authenticated identity.
pub const SESSION_USER_KEY: &str = "auth.user";
/// Session key holding the session creation timestamp.
pub const SESSION_CREATED_AT_KEY: &str = "auth.created_at";

/// Incoming payload for provisioning-token session bootstrap.
///
/// Stands in for the external identity provider: a trusted caller exchanges
/// the shared token for an organization-bound session.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub subject: String,
    pub token: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub organization_id: Option<String>,
}

pub async fn session_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<SessionRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.provisioning_token {
        return Err(AppError::Unauthorized("invalid provisioning token".to_owned()).into());
    }

    if payload.subject.trim().is_empty() {
        return Err(AppError::Validation("subject must not be empty".to_owned()).into());
    }

    let organization_id = match payload.organization_id {
        Some(value) => uuid::Uuid::parse_str(value.as_str())
            .map(OrganizationId::from_uuid)
            .map_err(|error| AppError::Validation(format!("invalid organization id: {error}")))?,
        None => state.default_organization_id.ok_or_else(|| {
            AppError::Validation("organization_id is required".to_owned())
        })?,
    };

    let subject = payload.subject;
    let display_name = payload.display_name.unwrap_or_else(|| subject.clone());
    let identity = UserIdentity::new(subject, display_name, payload.email, organization_id);

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(session: Session) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    Ok(Json(UserIdentityResponse::from(identity)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}
