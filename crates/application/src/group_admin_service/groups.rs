use super::*;

use tessera_core::{AppError, NonEmptyString};
use tessera_domain::AuditAction;

use crate::AuditEvent;
use crate::permission_ports::{CreateGroupInput, UpdateGroupInput};

impl GroupAdminService {
    /// Returns all permission groups in the actor's organization.
    pub async fn list_groups(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<Vec<PermissionGroupRecord>> {
        self.require_admin(actor, Action::Read).await?;
        self.groups.list_groups(actor.organization_id()).await
    }

    /// Creates a permission group and emits an audit event.
    pub async fn create_group(
        &self,
        actor: &UserIdentity,
        input: CreateGroupInput,
    ) -> AppResult<PermissionGroupRecord> {
        self.require_admin(actor, Action::Create).await?;

        let name = NonEmptyString::new(input.name.trim())?;
        if self
            .groups
            .find_group_by_name(actor.organization_id(), name.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "permission group '{}' already exists",
                name.as_str()
            )));
        }

        let group = self
            .groups
            .create_group(
                actor.organization_id(),
                CreateGroupInput {
                    name: name.into(),
                    permissions: input.permissions,
                },
                false,
            )
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                organization_id: actor.organization_id(),
                subject: actor.subject().to_owned(),
                action: AuditAction::PermissionGroupCreated,
                resource_type: "permission_group".to_owned(),
                resource_id: group.group_id.clone(),
                detail: Some(format!("created permission group '{}'", group.name)),
            })
            .await?;

        Ok(group)
    }

    /// Renames a group and/or replaces its grants, then emits an audit event.
    ///
    /// System groups accept no definition changes.
    pub async fn update_group(
        &self,
        actor: &UserIdentity,
        group_id: &str,
        input: UpdateGroupInput,
    ) -> AppResult<PermissionGroupRecord> {
        self.require_admin(actor, Action::Update).await?;

        let existing = self
            .groups
            .find_group(actor.organization_id(), group_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("permission group '{group_id}' was not found"))
            })?;

        if existing.is_system {
            return Err(AppError::Validation(format!(
                "system group '{}' cannot be modified",
                existing.name
            )));
        }

        let renamed_to = match input.name.as_deref() {
            Some(candidate) if candidate.trim() != existing.name => {
                let name = NonEmptyString::new(candidate.trim())?;
                if self
                    .groups
                    .find_group_by_name(actor.organization_id(), name.as_str())
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict(format!(
                        "permission group '{}' already exists",
                        name.as_str()
                    )));
                }
                Some(String::from(name))
            }
            _ => None,
        };

        let group = self
            .groups
            .update_group(
                actor.organization_id(),
                group_id,
                UpdateGroupInput {
                    name: renamed_to.clone(),
                    permissions: input.permissions,
                },
            )
            .await?;

        let detail = match renamed_to {
            Some(name) => format!(
                "updated permission group '{}' (renamed to '{name}')",
                existing.name
            ),
            None => format!("updated permission group '{}'", existing.name),
        };

        self.audit_repository
            .append_event(AuditEvent {
                organization_id: actor.organization_id(),
                subject: actor.subject().to_owned(),
                action: AuditAction::PermissionGroupUpdated,
                resource_type: "permission_group".to_owned(),
                resource_id: group.group_id.clone(),
                detail: Some(detail),
            })
            .await?;

        Ok(group)
    }

    /// Deletes a non-system group and its memberships, then emits an audit
    /// event.
    pub async fn delete_group(&self, actor: &UserIdentity, group_id: &str) -> AppResult<()> {
        self.require_admin(actor, Action::Delete).await?;

        let existing = self
            .groups
            .find_group(actor.organization_id(), group_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("permission group '{group_id}' was not found"))
            })?;

        if existing.is_system {
            return Err(AppError::Validation(format!(
                "system group '{}' cannot be deleted",
                existing.name
            )));
        }

        self.groups
            .delete_group(actor.organization_id(), group_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                organization_id: actor.organization_id(),
                subject: actor.subject().to_owned(),
                action: AuditAction::PermissionGroupDeleted,
                resource_type: "permission_group".to_owned(),
                resource_id: group_id.to_owned(),
                detail: Some(format!("deleted permission group '{}'", existing.name)),
            })
            .await
    }
}
