use async_trait::async_trait;

use tessera_application::{OverrideAdminRepository, OverrideRecord};
use tessera_core::{AppError, AppResult, OrganizationId};

use super::*;

#[async_trait]
impl OverrideAdminRepository for PostgresPermissionRepository {
    async fn list_overrides(
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
        .map_err(|error| AppError::Internal(format!("failed to list overrides: {error}")))?;

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

    async fn replace_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
        overrides: Vec<OverrideRecord>,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            DELETE FROM permission_overrides
            WHERE organization_id = $1
                AND user_id = $2
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(user_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear previous overrides: {error}"))
        })?;

        for record in &overrides {
            let resource_scope = record
                .resource_scope
                .as_ref()
                .map(serde_json::to_value)
                .transpose()
                .map_err(|error| {
                    AppError::Internal(format!("failed to encode override scope: {error}"))
                })?;

            sqlx::query(
                r#"
                INSERT INTO permission_overrides (
                    organization_id,
                    user_id,
                    permission,
                    granted,
                    resource_scope
                )
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(organization_id.as_uuid())
            .bind(user_id)
            .bind(record.permission.to_string())
            .bind(record.granted)
            .bind(resource_scope)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist override: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }
}
