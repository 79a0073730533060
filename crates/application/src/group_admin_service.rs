use std::sync::Arc;

use tessera_core::{AppResult, UserIdentity};
use tessera_domain::{Action, EffectivePermission, Resource};

use crate::permission_ports::{
    GroupAdminRepository, OverrideAdminRepository, OverrideRecord, PermissionGroupRecord,
    PermissionQueryRepository,
};
use crate::{AuditRepository, PermissionService};

mod groups;
mod members;
mod overrides;
mod seed;


pub use seed::DEFAULT_GROUP_NAMES;

/// Per-user administrative projection: group memberships, resolved effective
/// permissions and raw overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPermissionSummary {
    /// User the summary describes.
    pub user_id: String,
    /// Groups the user belongs to.
    pub groups: Vec<PermissionGroupRecord>,
    /// Effective permissions after merging all grant sources.
    pub effective: Vec<EffectivePermission>,
    /// Raw override rows for the user.
    pub overrides: Vec<OverrideRecord>,
}

/// Application service for permission group, membership and override
/// administration.
///
/// Every mutation appends an audit event; structural violations (duplicates,
/// system-group edits, missing entities) surface as errors and leave state
/// unchanged.
#[derive(Clone)]
pub struct GroupAdminService {
    permission_service: PermissionService,
    groups: Arc<dyn GroupAdminRepository>,
    overrides: Arc<dyn OverrideAdminRepository>,
    query: Arc<dyn PermissionQueryRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl GroupAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        permission_service: PermissionService,
        groups: Arc<dyn GroupAdminRepository>,
        overrides: Arc<dyn OverrideAdminRepository>,
        query: Arc<dyn PermissionQueryRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            permission_service,
            groups,
            overrides,
            query,
            audit_repository,
        }
    }

    async fn require_admin(&self, actor: &UserIdentity, action: Action) -> AppResult<()> {
        self.permission_service
            .require_permission(actor, Resource::Permissions, action)
            .await
    }
}
