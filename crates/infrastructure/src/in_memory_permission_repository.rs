use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use tessera_application::{
    CreateGroupInput, GroupAdminRepository, GroupMembership, OverrideAdminRepository,
    OverrideRecord, PermissionGroupRecord, PermissionQueryRepository, UpdateGroupInput,
};
use tessera_core::{AppError, AppResult, OrganizationId};

/// In-memory permission repository implementation.
///
/// Backs handler tests and local development without a database. Mirrors the
/// PostgreSQL adapter's conflict and not-found behavior.
#[derive(Debug, Default)]
pub struct InMemoryPermissionRepository {
    groups: RwLock<HashMap<(OrganizationId, String), PermissionGroupRecord>>,
    memberships: RwLock<Vec<(OrganizationId, String, String)>>,
    overrides: RwLock<HashMap<(OrganizationId, String), Vec<OverrideRecord>>>,
}

impl InMemoryPermissionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionQueryRepository for InMemoryPermissionRepository {
    async fn groups_for_user(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Vec<PermissionGroupRecord>> {
        let memberships = self.memberships.read().await;
        let groups = self.groups.read().await;

        let mut joined: Vec<PermissionGroupRecord> = memberships
            .iter()
            .filter(|(stored_organization, _, member)| {
                *stored_organization == organization_id && member == user_id
            })
            .filter_map(|(_, group_id, _)| {
                groups.get(&(organization_id, group_id.clone())).cloned()
            })
            .collect();
        joined.sort_by(|left, right| left.name.cmp(&right.name));

        Ok(joined)
    }

    async fn overrides_for_user(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Vec<OverrideRecord>> {
        Ok(self
            .overrides
            .read()
            .await
            .get(&(organization_id, user_id.to_owned()))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl GroupAdminRepository for InMemoryPermissionRepository {
    async fn list_groups(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<PermissionGroupRecord>> {
        let groups = self.groups.read().await;

        let mut listed: Vec<PermissionGroupRecord> = groups
            .iter()
            .filter_map(|((stored_organization, _), group)| {
                (*stored_organization == organization_id).then_some(group.clone())
            })
            .collect();
        listed.sort_by(|left, right| left.name.cmp(&right.name));

        Ok(listed)
    }

    async fn find_group(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
    ) -> AppResult<Option<PermissionGroupRecord>> {
        Ok(self
            .groups
            .read()
            .await
            .get(&(organization_id, group_id.to_owned()))
            .cloned())
    }

    async fn find_group_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<PermissionGroupRecord>> {
        Ok(self
            .groups
            .read()
            .await
            .values()
            .find(|group| group.organization_id == organization_id && group.name == name)
            .cloned())
    }

    async fn create_group(
        &self,
        organization_id: OrganizationId,
        input: CreateGroupInput,
        is_system: bool,
    ) -> AppResult<PermissionGroupRecord> {
        let mut groups = self.groups.write().await;

        if groups
            .values()
            .any(|group| group.organization_id == organization_id && group.name == input.name)
        {
            return Err(AppError::Conflict(format!(
                "permission group '{}' already exists",
                input.name
            )));
        }

        let group = PermissionGroupRecord {
            group_id: Uuid::new_v4().to_string(),
            organization_id,
            name: input.name,
            is_system,
            permissions: input.permissions,
        };
        groups.insert((organization_id, group.group_id.clone()), group.clone());

        Ok(group)
    }

    async fn update_group(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
        input: UpdateGroupInput,
    ) -> AppResult<PermissionGroupRecord> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(&(organization_id, group_id.to_owned()))
            .ok_or_else(|| {
                AppError::NotFound(format!("permission group '{group_id}' was not found"))
            })?;

        if let Some(name) = input.name {
            group.name = name;
        }
        if let Some(permissions) = input.permissions {
            group.permissions = permissions;
        }

        Ok(group.clone())
    }

    async fn delete_group(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
    ) -> AppResult<()> {
        let removed = self
            .groups
            .write()
            .await
            .remove(&(organization_id, group_id.to_owned()));

        if removed.is_none() {
            return Err(AppError::NotFound(format!(
                "permission group '{group_id}' was not found"
            )));
        }

        self.memberships.write().await.retain(
            |(stored_organization, stored_group, _)| {
                !(*stored_organization == organization_id && stored_group == group_id)
            },
        );

        Ok(())
    }

    async fn list_members(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
    ) -> AppResult<Vec<GroupMembership>> {
        let group_name = self
            .groups
            .read()
            .await
            .get(&(organization_id, group_id.to_owned()))
            .map(|group| group.name.clone())
            .unwrap_or_default();

        let mut members: Vec<GroupMembership> = self
            .memberships
            .read()
            .await
            .iter()
            .filter(|(stored_organization, stored_group, _)| {
                *stored_organization == organization_id && stored_group == group_id
            })
            .map(|(_, stored_group, user_id)| GroupMembership {
                user_id: user_id.clone(),
                group_id: stored_group.clone(),
                group_name: group_name.clone(),
                added_at: "1970-01-01T00:00:00Z".to_owned(),
            })
            .collect();
        members.sort_by(|left, right| left.user_id.cmp(&right.user_id));

        Ok(members)
    }

    async fn add_member(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<GroupMembership> {
        let group_name = self
            .groups
            .read()
            .await
            .get(&(organization_id, group_id.to_owned()))
            .map(|group| group.name.clone())
            .ok_or_else(|| {
                AppError::NotFound(format!("permission group '{group_id}' was not found"))
            })?;

        let mut memberships = self.memberships.write().await;
        if memberships.iter().any(|(stored_organization, stored_group, member)| {
            *stored_organization == organization_id
                && stored_group == group_id
                && member == user_id
        }) {
            return Err(AppError::Conflict(format!(
                "'{user_id}' is already a member of group '{group_id}'"
            )));
        }

        memberships.push((organization_id, group_id.to_owned(), user_id.to_owned()));

        Ok(GroupMembership {
            user_id: user_id.to_owned(),
            group_id: group_id.to_owned(),
            group_name,
            added_at: "1970-01-01T00:00:00Z".to_owned(),
        })
    }

    async fn remove_member(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        let mut memberships = self.memberships.write().await;
        let before = memberships.len();
        memberships.retain(|(stored_organization, stored_group, member)| {
            !(*stored_organization == organization_id
                && stored_group == group_id
                && member == user_id)
        });

        if memberships.len() == before {
            return Err(AppError::NotFound(format!(
                "membership '{group_id}:{user_id}' was not found"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl OverrideAdminRepository for InMemoryPermissionRepository {
    async fn list_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Vec<OverrideRecord>> {
        Ok(self
            .overrides
            .read()
            .await
            .get(&(organization_id, user_id.to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
        overrides: Vec<OverrideRecord>,
    ) -> AppResult<()> {
        self.overrides
            .write()
            .await
            .insert((organization_id, user_id.to_owned()), overrides);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tessera_application::{
        CreateGroupInput, GroupAdminRepository, OverrideAdminRepository, OverrideRecord,
        PermissionQueryRepository,
    };
    use tessera_core::OrganizationId;
    use tessera_domain::{Action, PermissionKey, Resource};

    use super::InMemoryPermissionRepository;

    fn input(name: &str) -> CreateGroupInput {
        CreateGroupInput {
            name: name.to_owned(),
            permissions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn groups_do_not_leak_across_organizations() {
        let repository = InMemoryPermissionRepository::new();
        let left = OrganizationId::new();
        let right = OrganizationId::new();

        assert!(repository.create_group(left, input("Viewers"), false).await.is_ok());
        assert!(repository.create_group(right, input("Editors"), false).await.is_ok());

        let listed = repository.list_groups(left).await.unwrap_or_default();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Viewers");
    }

    #[tokio::test]
    async fn duplicate_group_name_conflicts_within_one_organization() {
        let repository = InMemoryPermissionRepository::new();
        let organization_id = OrganizationId::new();

        assert!(
            repository
                .create_group(organization_id, input("Viewers"), false)
                .await
                .is_ok()
        );
        assert!(
            repository
                .create_group(organization_id, input("Viewers"), false)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn deleting_a_group_removes_its_memberships() {
        let repository = InMemoryPermissionRepository::new();
        let organization_id = OrganizationId::new();

        let group = repository
            .create_group(organization_id, input("Viewers"), false)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(
            repository
                .add_member(organization_id, &group.group_id, "alice")
                .await
                .is_ok()
        );

        assert!(
            repository
                .delete_group(organization_id, &group.group_id)
                .await
                .is_ok()
        );

        let groups = repository
            .groups_for_user(organization_id, "alice")
            .await
            .unwrap_or_default();
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn replace_overrides_is_wholesale() {
        let repository = InMemoryPermissionRepository::new();
        let organization_id = OrganizationId::new();

        let first = vec![OverrideRecord {
            user_id: "alice".to_owned(),
            permission: PermissionKey::new(Resource::Risk, Action::Read),
            granted: true,
            resource_scope: None,
        }];
        assert!(
            repository
                .replace_overrides(organization_id, "alice", first)
                .await
                .is_ok()
        );

        assert!(
            repository
                .replace_overrides(organization_id, "alice", Vec::new())
                .await
                .is_ok()
        );

        let listed = repository
            .list_overrides(organization_id, "alice")
            .await
            .unwrap_or_default();
        assert!(listed.is_empty());
    }
}
