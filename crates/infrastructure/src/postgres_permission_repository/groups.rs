use async_trait::async_trait;

use tessera_application::{
    CreateGroupInput, GroupAdminRepository, GroupMembership, PermissionGroupRecord,
    UpdateGroupInput,
};
use tessera_core::{AppError, AppResult, OrganizationId};

use super::*;

#[async_trait]
impl GroupAdminRepository for PostgresPermissionRepository {
    async fn list_groups(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<PermissionGroupRecord>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT
                id AS group_id,
                name,
                is_system,
                permissions
            FROM permission_groups
            WHERE organization_id = $1
            ORDER BY name
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission groups: {error}"))
        })?;

        rows.into_iter()
            .map(|row| group_record(row, organization_id))
            .collect()
    }

    async fn find_group(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
    ) -> AppResult<Option<PermissionGroupRecord>> {
        let Some(group_uuid) = parse_group_id(group_id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT
                id AS group_id,
                name,
                is_system,
                permissions
            FROM permission_groups
            WHERE organization_id = $1
                AND id = $2
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(group_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find permission group: {error}"))
        })?;

        row.map(|row| group_record(row, organization_id)).transpose()
    }

    async fn find_group_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<PermissionGroupRecord>> {
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT
                id AS group_id,
                name,
                is_system,
                permissions
            FROM permission_groups
            WHERE organization_id = $1
                AND name = $2
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find permission group: {error}"))
        })?;

        row.map(|row| group_record(row, organization_id)).transpose()
    }

    async fn create_group(
        &self,
        organization_id: OrganizationId,
        input: CreateGroupInput,
        is_system: bool,
    ) -> AppResult<PermissionGroupRecord> {
        let permissions = encode_grants(&input.permissions)?;

        let group_id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO permission_groups (organization_id, name, is_system, permissions)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(input.name.as_str())
        .bind(is_system)
        .bind(permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_group_conflict(error, input.name.as_str()))?;

        Ok(PermissionGroupRecord {
            group_id: group_id.to_string(),
            organization_id,
            name: input.name,
            is_system,
            permissions: input.permissions,
        })
    }

    async fn update_group(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
        input: UpdateGroupInput,
    ) -> AppResult<PermissionGroupRecord> {
        let group_uuid = parse_group_id(group_id).ok_or_else(|| {
            AppError::NotFound(format!("permission group '{group_id}' was not found"))
        })?;
        let permissions = input.permissions.as_deref().map(encode_grants).transpose()?;

        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            UPDATE permission_groups
            SET
                name = COALESCE($3, name),
                permissions = COALESCE($4, permissions),
                updated_at = now()
            WHERE organization_id = $1
                AND id = $2
            RETURNING
                id AS group_id,
                name,
                is_system,
                permissions
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(group_uuid)
        .bind(input.name)
        .bind(permissions)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_group_conflict(error, group_id))?
        .ok_or_else(|| {
            AppError::NotFound(format!("permission group '{group_id}' was not found"))
        })?;

        group_record(row, organization_id)
    }

    async fn delete_group(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
    ) -> AppResult<()> {
        let group_uuid = parse_group_id(group_id).ok_or_else(|| {
            AppError::NotFound(format!("permission group '{group_id}' was not found"))
        })?;

        // Memberships cascade with the group row.
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM permission_groups
            WHERE organization_id = $1
                AND id = $2
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(group_uuid)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete permission group: {error}"))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "permission group '{group_id}' was not found"
            )));
        }

        Ok(())
    }

    async fn list_members(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
    ) -> AppResult<Vec<GroupMembership>> {
        let Some(group_uuid) = parse_group_id(group_id) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT
                members.user_id,
                members.group_id,
                groups.name AS group_name,
                to_char(members.created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS added_at
            FROM permission_group_members AS members
            INNER JOIN permission_groups AS groups
                ON groups.id = members.group_id
            WHERE groups.organization_id = $1
                AND members.group_id = $2
            ORDER BY members.user_id
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(group_uuid)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list group members: {error}")))?;

        Ok(rows.into_iter().map(membership_record).collect())
    }

    async fn add_member(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<GroupMembership> {
        let group_uuid = parse_group_id(group_id).ok_or_else(|| {
            AppError::NotFound(format!("permission group '{group_id}' was not found"))
        })?;

        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            WITH inserted AS (
                INSERT INTO permission_group_members (group_id, organization_id, user_id)
                VALUES ($2, $1, $3)
                RETURNING group_id, user_id, created_at
            )
            SELECT
                inserted.user_id,
                inserted.group_id,
                groups.name AS group_name,
                to_char(inserted.created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS added_at
            FROM inserted
            INNER JOIN permission_groups AS groups
                ON groups.id = inserted.group_id
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(group_uuid)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_membership_conflict(error, group_id, user_id))?;

        Ok(membership_record(row))
    }

    async fn remove_member(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        let group_uuid = parse_group_id(group_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "membership '{group_id}:{user_id}' was not found"
            ))
        })?;

        let rows_affected = sqlx::query(
            r#"
            DELETE FROM permission_group_members
            WHERE organization_id = $1
                AND group_id = $2
                AND user_id = $3
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(group_uuid)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to remove group member: {error}"))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "membership '{group_id}:{user_id}' was not found"
            )));
        }

        Ok(())
    }
}

fn group_record(row: GroupRow, organization_id: OrganizationId) -> AppResult<PermissionGroupRecord> {
    let permissions = decode_grants(row.permissions, organization_id, &row.name)?;
    Ok(PermissionGroupRecord {
        group_id: row.group_id.to_string(),
        organization_id,
        name: row.name,
        is_system: row.is_system,
        permissions,
    })
}

fn membership_record(row: MembershipRow) -> GroupMembership {
    GroupMembership {
        user_id: row.user_id,
        group_id: row.group_id.to_string(),
        group_name: row.group_name,
        added_at: row.added_at,
    }
}

fn map_membership_conflict(error: sqlx::Error, group_id: &str, user_id: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "'{user_id}' is already a member of group '{group_id}'"
        ));
    }

    AppError::Internal(format!("failed to add group member: {error}"))
}
