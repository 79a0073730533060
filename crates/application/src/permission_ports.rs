use async_trait::async_trait;
use tessera_core::{AppResult, OrganizationId};
use tessera_domain::{PermissionGrant, PermissionKey, Scope};

/// Persisted permission group projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGroupRecord {
    /// Stable group identifier.
    pub group_id: String,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Unique group name in organization scope.
    pub name: String,
    /// Indicates a built-in group whose definition cannot change.
    pub is_system: bool,
    /// Grant statements attached to the group.
    pub permissions: Vec<PermissionGrant>,
}

/// Projection mapping a user to a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    /// Member user identifier.
    pub user_id: String,
    /// Group identifier.
    pub group_id: String,
    /// Group name.
    pub group_name: String,
    /// Membership timestamp in RFC3339.
    pub added_at: String,
}

/// Per-user, per-permission grant or denial exception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRecord {
    /// User the override applies to.
    pub user_id: String,
    /// Permission the override targets.
    pub permission: PermissionKey,
    /// Whether the action is granted or withdrawn.
    pub granted: bool,
    /// Replacement scope for granting overrides, when present.
    pub resource_scope: Option<Scope>,
}

/// Input payload for creating permission groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupInput {
    /// Unique group name in organization scope.
    pub name: String,
    /// Grants to attach to the group.
    pub permissions: Vec<PermissionGrant>,
}

/// Input payload for renaming a group or replacing its grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateGroupInput {
    /// New group name, when renaming.
    pub name: Option<String>,
    /// Replacement grant list, when changing grants.
    pub permissions: Option<Vec<PermissionGrant>>,
}

/// Read-side port feeding the effective permission evaluator.
#[async_trait]
pub trait PermissionQueryRepository: Send + Sync {
    /// Lists the groups a user belongs to, with their grants.
    async fn groups_for_user(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Vec<PermissionGroupRecord>>;

    /// Lists a user's overrides ordered by most recent administrative write
    /// last.
    async fn overrides_for_user(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Vec<OverrideRecord>>;
}

/// Repository port for permission group and membership administration.
#[async_trait]
pub trait GroupAdminRepository: Send + Sync {
    /// Lists all groups in organization scope.
    async fn list_groups(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<PermissionGroupRecord>>;

    /// Finds a group by id in organization scope.
    async fn find_group(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
    ) -> AppResult<Option<PermissionGroupRecord>>;

    /// Finds a group by name in organization scope.
    async fn find_group_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<PermissionGroupRecord>>;

    /// Creates a group; duplicate names in the organization are a conflict.
    async fn create_group(
        &self,
        organization_id: OrganizationId,
        input: CreateGroupInput,
        is_system: bool,
    ) -> AppResult<PermissionGroupRecord>;

    /// Renames a group and/or replaces its grants.
    async fn update_group(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
        input: UpdateGroupInput,
    ) -> AppResult<PermissionGroupRecord>;

    /// Deletes a group together with its memberships.
    async fn delete_group(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
    ) -> AppResult<()>;

    /// Lists members of a group.
    async fn list_members(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
    ) -> AppResult<Vec<GroupMembership>>;

    /// Adds a user to a group; an existing pair is a conflict.
    async fn add_member(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<GroupMembership>;

    /// Removes a user from a group; a missing pair is not found.
    async fn remove_member(
        &self,
        organization_id: OrganizationId,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<()>;
}

/// Repository port for user override administration.
#[async_trait]
pub trait OverrideAdminRepository: Send + Sync {
    /// Lists a user's overrides.
    async fn list_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Vec<OverrideRecord>>;

    /// Replaces a user's entire override set in one transaction.
    async fn replace_overrides(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
        overrides: Vec<OverrideRecord>,
    ) -> AppResult<()>;
}
