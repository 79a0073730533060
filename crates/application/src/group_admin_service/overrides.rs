use std::collections::BTreeMap;

use super::*;

use tessera_domain::{AuditAction, PermissionKey};

use crate::AuditEvent;

impl GroupAdminService {
    /// Returns a user's raw override rows.
    pub async fn get_user_overrides(
        &self,
        actor: &UserIdentity,
        user_id: &str,
    ) -> AppResult<Vec<OverrideRecord>> {
        self.require_admin(actor, Action::Read).await?;

        self.overrides
            .list_overrides(actor.organization_id(), user_id)
            .await
    }

    /// Replaces a user's entire override set and emits an audit event.
    ///
    /// Callers pass the complete desired list every time; this is a wholesale
    /// replacement, not a patch. Duplicate entries for one permission collapse
    /// to the last occurrence, matching the one-row-per-permission storage
    /// constraint.
    pub async fn set_user_overrides(
        &self,
        actor: &UserIdentity,
        user_id: &str,
        overrides: Vec<OverrideRecord>,
    ) -> AppResult<Vec<OverrideRecord>> {
        self.require_admin(actor, Action::Update).await?;

        let mut by_key: BTreeMap<PermissionKey, OverrideRecord> = BTreeMap::new();
        for mut record in overrides {
            record.user_id = user_id.to_owned();
            by_key.insert(record.permission, record);
        }
        let deduplicated: Vec<OverrideRecord> = by_key.into_values().collect();

        self.overrides
            .replace_overrides(actor.organization_id(), user_id, deduplicated.clone())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                organization_id: actor.organization_id(),
                subject: actor.subject().to_owned(),
                action: AuditAction::PermissionOverridesReplaced,
                resource_type: "permission_override".to_owned(),
                resource_id: user_id.to_owned(),
                detail: Some(format!(
                    "replaced overrides for '{user_id}' ({} entries)",
                    deduplicated.len()
                )),
            })
            .await?;

        Ok(deduplicated)
    }

    /// Returns the administrative summary for one user: group memberships,
    /// effective permissions and raw overrides.
    pub async fn user_permission_summary(
        &self,
        actor: &UserIdentity,
        user_id: &str,
    ) -> AppResult<UserPermissionSummary> {
        self.require_admin(actor, Action::Read).await?;

        let groups = self
            .query
            .groups_for_user(actor.organization_id(), user_id)
            .await?;
        let effective = self
            .permission_service
            .effective_permissions(actor.organization_id(), user_id)
            .await?;
        let overrides = self
            .overrides
            .list_overrides(actor.organization_id(), user_id)
            .await?;

        Ok(UserPermissionSummary {
            user_id: user_id.to_owned(),
            groups,
            effective,
            overrides,
        })
    }
}
