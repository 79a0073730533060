use std::str::FromStr;

use serde_json::Value;
use sqlx::{FromRow, PgPool};

use tessera_core::{AppError, AppResult, OrganizationId};
use tessera_domain::{PermissionGrant, PermissionKey, Scope};

mod groups;
mod overrides;
mod query;

/// PostgreSQL-backed repository for permission groups, memberships and user
/// overrides.
///
/// Group grants are stored as one JSONB document per group; overrides are one
/// row per `resource:action` key, enforced by a unique index.
#[derive(Clone)]
pub struct PostgresPermissionRepository {
    pool: PgPool,
}

impl PostgresPermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GroupRow {
    group_id: uuid::Uuid,
    name: String,
    is_system: bool,
    permissions: Value,
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    user_id: String,
    group_id: uuid::Uuid,
    group_name: String,
    added_at: String,
}

#[derive(Debug, FromRow)]
struct OverrideRow {
    user_id: String,
    permission: String,
    granted: bool,
    resource_scope: Option<Value>,
}

fn decode_grants(
    permissions: Value,
    organization_id: OrganizationId,
    group_name: &str,
) -> AppResult<Vec<PermissionGrant>> {
    serde_json::from_value(permissions).map_err(|error| {
        AppError::Internal(format!(
            "invalid stored grants for group '{group_name}' in organization '{organization_id}': {error}"
        ))
    })
}

fn decode_override_key(permission: &str, organization_id: OrganizationId) -> AppResult<PermissionKey> {
    PermissionKey::from_str(permission).map_err(|error| {
        AppError::Internal(format!(
            "invalid stored override key '{permission}' in organization '{organization_id}': {error}"
        ))
    })
}

fn decode_override_scope(
    resource_scope: Option<Value>,
    organization_id: OrganizationId,
) -> AppResult<Option<Scope>> {
    resource_scope
        .map(|value| {
            serde_json::from_value(value).map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored override scope in organization '{organization_id}': {error}"
                ))
            })
        })
        .transpose()
}

fn encode_grants(permissions: &[PermissionGrant]) -> AppResult<Value> {
    serde_json::to_value(permissions)
        .map_err(|error| AppError::Internal(format!("failed to encode grants: {error}")))
}

// Group ids are UUIDs in storage; a malformed id cannot match any row.
fn parse_group_id(group_id: &str) -> Option<uuid::Uuid> {
    uuid::Uuid::from_str(group_id).ok()
}

fn map_group_conflict(error: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("permission group '{name}' already exists"));
    }

    AppError::Internal(format!("failed to persist permission group: {error}"))
}
