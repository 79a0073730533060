use super::*;

use tessera_core::AppError;
use tessera_domain::AuditAction;

use crate::AuditEvent;
use crate::permission_ports::GroupMembership;

impl GroupAdminService {
    /// Returns the members of a group.
    pub async fn list_members(
        &self,
        actor: &UserIdentity,
        group_id: &str,
    ) -> AppResult<Vec<GroupMembership>> {
        self.require_admin(actor, Action::Read).await?;
        self.ensure_group_exists(actor, group_id).await?;

        self.groups
            .list_members(actor.organization_id(), group_id)
            .await
    }

    /// Adds a user to a group and emits an audit event.
    pub async fn add_member(
        &self,
        actor: &UserIdentity,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<GroupMembership> {
        self.require_admin(actor, Action::Update).await?;
        let group = self.ensure_group_exists(actor, group_id).await?;

        let membership = self
            .groups
            .add_member(actor.organization_id(), group_id, user_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                organization_id: actor.organization_id(),
                subject: actor.subject().to_owned(),
                action: AuditAction::PermissionMemberAdded,
                resource_type: "permission_group_member".to_owned(),
                resource_id: format!("{group_id}:{user_id}"),
                detail: Some(format!("added '{user_id}' to group '{}'", group.name)),
            })
            .await?;

        Ok(membership)
    }

    /// Removes a user from a group and emits an audit event.
    pub async fn remove_member(
        &self,
        actor: &UserIdentity,
        group_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        self.require_admin(actor, Action::Update).await?;
        let group = self.ensure_group_exists(actor, group_id).await?;

        self.groups
            .remove_member(actor.organization_id(), group_id, user_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                organization_id: actor.organization_id(),
                subject: actor.subject().to_owned(),
                action: AuditAction::PermissionMemberRemoved,
                resource_type: "permission_group_member".to_owned(),
                resource_id: format!("{group_id}:{user_id}"),
                detail: Some(format!("removed '{user_id}' from group '{}'", group.name)),
            })
            .await
    }

    async fn ensure_group_exists(
        &self,
        actor: &UserIdentity,
        group_id: &str,
    ) -> AppResult<PermissionGroupRecord> {
        self.groups
            .find_group(actor.organization_id(), group_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("permission group '{group_id}' was not found"))
            })
    }
}
