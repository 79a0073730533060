use async_trait::async_trait;

use tessera_application::{OverrideRecord, PermissionGroupRecord, PermissionQueryRepository};
use tessera_core::{AppError, AppResult, OrganizationId};

use super::*;

#[async_trait]
impl PermissionQueryRepository for PostgresPermissionRepository {
    async fn groups_for_user(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Vec<PermissionGroupRecord>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT
                groups.id AS group_id,
                groups.name,
                groups.is_system,
                groups.permissions
            FROM permission_groups AS groups
            INNER JOIN permission_group_members AS members
                ON members.group_id = groups.id
            WHERE groups.organization_id = $1
                AND members.user_id = $2
            ORDER BY groups.name
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user groups: {error}")))?;

        rows.into_iter()
            .map(|row| {
                let permissions = decode_grants(row.permissions, organization_id, &row.name)?;
                Ok(PermissionGroupRecord {
                    group_id: row.group_id.to_string(),
                    organization_id,
                    name: row.name,
                    is_system: row.is_system,
                    permissions,
                })
            })
            .collect()
    }

    async fn overrides_for_user(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Vec<OverrideRecord>> {
        let rows = sqlx::query_as::<_, OverrideRow>(
            r#"
            SELECT
                user_id,
                permission,
                granted,
                resource_scope
            FROM permission_overrides
            WHERE organization_id = $1
                AND user_id = $2
            ORDER BY created_at, permission
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user overrides: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Ok(OverrideRecord {
                    user_id: row.user_id,
                    permission: decode_override_key(&row.permission, organization_id)?,
                    granted: row.granted,
                    resource_scope: decode_override_scope(row.resource_scope, organization_id)?,
                })
            })
            .collect()
    }
}
