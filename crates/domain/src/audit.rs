use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a permission group is created.
    PermissionGroupCreated,
    /// Emitted when a permission group is renamed or its grants change.
    PermissionGroupUpdated,
    /// Emitted when a permission group is deleted.
    PermissionGroupDeleted,
    /// Emitted when a user is added to a group.
    PermissionMemberAdded,
    /// Emitted when a user is removed from a group.
    PermissionMemberRemoved,
    /// Emitted when a user's override set is replaced.
    PermissionOverridesReplaced,
    /// Emitted when default groups are seeded for an organization.
    PermissionGroupsSeeded,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionGroupCreated => "permission.group.created",
            Self::PermissionGroupUpdated => "permission.group.updated",
            Self::PermissionGroupDeleted => "permission.group.deleted",
            Self::PermissionMemberAdded => "permission.member.added",
            Self::PermissionMemberRemoved => "permission.member.removed",
            Self::PermissionOverridesReplaced => "permission.overrides.replaced",
            Self::PermissionGroupsSeeded => "permission.groups.seeded",
        }
    }
}
