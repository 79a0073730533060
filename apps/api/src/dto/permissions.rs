use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_application::{
    GroupMembership, OverrideRecord, PermissionDecision, PermissionGroupRecord,
    UserPermissionSummary,
};
use tessera_core::AppResult;
use tessera_domain::{
    Action, EffectivePermission, OwnershipMode, PermissionGrant, PermissionKey, Resource,
    ResourceContext, Scope,
};
use ts_rs::TS;

/// Transport representation of a grant scope.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/scope-request.ts"
)]
pub struct ScopeRequest {
    pub ownership: Option<String>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
}

impl ScopeRequest {
    pub fn into_scope(self) -> AppResult<Scope> {
        let ownership = match self.ownership.as_deref() {
            Some(value) => OwnershipMode::from_str(value)?,
            None => OwnershipMode::All,
        };

        Ok(Scope {
            ownership,
            tags: self.tags.map(|tags| tags.into_iter().collect()),
            categories: self
                .categories
                .map(|categories| categories.into_iter().collect()),
        })
    }
}

/// Transport representation of one grant statement.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-grant-request.ts"
)]
pub struct PermissionGrantRequest {
    pub resource: String,
    pub actions: Vec<String>,
    pub scope: Option<ScopeRequest>,
}

impl PermissionGrantRequest {
    pub fn into_grant(self) -> AppResult<PermissionGrant> {
        let resource = Resource::from_str(self.resource.as_str())?;
        let actions = self
            .actions
            .iter()
            .map(|value| Action::from_str(value.as_str()))
            .collect::<AppResult<Vec<_>>>()?;
        let scope = match self.scope {
            Some(scope) => scope.into_scope()?,
            None => Scope::unrestricted(),
        };

        Ok(PermissionGrant::new(resource, actions, scope))
    }
}

/// Incoming payload for permission group creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-permission-group-request.ts"
)]
pub struct CreatePermissionGroupRequest {
    pub name: String,
    pub permissions: Vec<PermissionGrantRequest>,
}

/// Incoming payload for permission group updates.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-permission-group-request.ts"
)]
pub struct UpdatePermissionGroupRequest {
    pub name: Option<String>,
    pub permissions: Option<Vec<PermissionGrantRequest>>,
}

/// Incoming payload for adding a group member.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/add-group-member-request.ts"
)]
pub struct AddGroupMemberRequest {
    pub user_id: String,
}

/// One entry of a user's replacement override set.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/override-entry-request.ts"
)]
pub struct OverrideEntryRequest {
    pub permission: String,
    pub granted: bool,
    pub resource_scope: Option<ScopeRequest>,
}

impl OverrideEntryRequest {
    pub fn into_record(self, user_id: &str) -> AppResult<OverrideRecord> {
        let permission = PermissionKey::from_str(self.permission.as_str())?;
        let resource_scope = self
            .resource_scope
            .map(ScopeRequest::into_scope)
            .transpose()?;

        Ok(OverrideRecord {
            user_id: user_id.to_owned(),
            permission,
            granted: self.granted,
            resource_scope,
        })
    }
}

/// Incoming payload for default-group seeding.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/seed-default-groups-request.ts"
)]
pub struct SeedDefaultGroupsRequest {
    pub organization_id: String,
    pub token: String,
}

/// API representation of a grant scope.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/scope-response.ts"
)]
pub struct ScopeResponse {
    pub ownership: String,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
}

impl From<Scope> for ScopeResponse {
    fn from(value: Scope) -> Self {
        Self {
            ownership: value.ownership.as_str().to_owned(),
            tags: value.tags.map(|tags| tags.into_iter().collect()),
            categories: value
                .categories
                .map(|categories| categories.into_iter().collect()),
        }
    }
}

/// API representation of one grant statement.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-grant-response.ts"
)]
pub struct PermissionGrantResponse {
    pub resource: String,
    pub actions: Vec<String>,
    pub scope: ScopeResponse,
}

impl From<PermissionGrant> for PermissionGrantResponse {
    fn from(value: PermissionGrant) -> Self {
        Self {
            resource: value.resource.as_str().to_owned(),
            actions: value
                .actions
                .into_iter()
                .map(|action| action.as_str().to_owned())
                .collect(),
            scope: ScopeResponse::from(value.scope),
        }
    }
}

/// API representation of a permission group.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-group-response.ts"
)]
pub struct PermissionGroupResponse {
    pub group_id: String,
    pub name: String,
    pub is_system: bool,
    pub permissions: Vec<PermissionGrantResponse>,
}

impl From<PermissionGroupRecord> for PermissionGroupResponse {
    fn from(value: PermissionGroupRecord) -> Self {
        Self {
            group_id: value.group_id,
            name: value.name,
            is_system: value.is_system,
            permissions: value
                .permissions
                .into_iter()
                .map(PermissionGrantResponse::from)
                .collect(),
        }
    }
}

/// API representation of a group membership.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/group-membership-response.ts"
)]
pub struct GroupMembershipResponse {
    pub user_id: String,
    pub group_id: String,
    pub group_name: String,
    pub added_at: String,
}

impl From<GroupMembership> for GroupMembershipResponse {
    fn from(value: GroupMembership) -> Self {
        Self {
            user_id: value.user_id,
            group_id: value.group_id,
            group_name: value.group_name,
            added_at: value.added_at,
        }
    }
}

/// API representation of a user override.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/override-response.ts"
)]
pub struct OverrideResponse {
    pub user_id: String,
    pub permission: String,
    pub granted: bool,
    pub resource_scope: Option<ScopeResponse>,
}

impl From<OverrideRecord> for OverrideResponse {
    fn from(value: OverrideRecord) -> Self {
        Self {
            user_id: value.user_id,
            permission: value.permission.to_string(),
            granted: value.granted,
            resource_scope: value.resource_scope.map(ScopeResponse::from),
        }
    }
}

/// API representation of one resolved permission entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/effective-permission-response.ts"
)]
pub struct EffectivePermissionResponse {
    pub resource: String,
    pub actions: Vec<String>,
    pub scope: ScopeResponse,
    pub source: String,
    pub group_name: Option<String>,
}

impl From<EffectivePermission> for EffectivePermissionResponse {
    fn from(value: EffectivePermission) -> Self {
        Self {
            resource: value.resource.as_str().to_owned(),
            actions: value
                .actions
                .into_iter()
                .map(|action| action.as_str().to_owned())
                .collect(),
            scope: ScopeResponse::from(value.scope),
            source: value.source.as_str().to_owned(),
            group_name: value.group_name,
        }
    }
}

/// API representation of a permission check outcome.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-decision-response.ts"
)]
pub struct PermissionDecisionResponse {
    pub allowed: bool,
    pub reason: String,
    pub matched: Option<EffectivePermissionResponse>,
}

impl From<PermissionDecision> for PermissionDecisionResponse {
    fn from(value: PermissionDecision) -> Self {
        Self {
            allowed: value.allowed,
            reason: value.reason,
            matched: value.matched.map(EffectivePermissionResponse::from),
        }
    }
}

/// API representation of a user's administrative permission summary.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-permission-summary-response.ts"
)]
pub struct UserPermissionSummaryResponse {
    pub user_id: String,
    pub groups: Vec<PermissionGroupResponse>,
    pub effective: Vec<EffectivePermissionResponse>,
    pub overrides: Vec<OverrideResponse>,
}

impl From<UserPermissionSummary> for UserPermissionSummaryResponse {
    fn from(value: UserPermissionSummary) -> Self {
        Self {
            user_id: value.user_id,
            groups: value
                .groups
                .into_iter()
                .map(PermissionGroupResponse::from)
                .collect(),
            effective: value
                .effective
                .into_iter()
                .map(EffectivePermissionResponse::from)
                .collect(),
            overrides: value
                .overrides
                .into_iter()
                .map(OverrideResponse::from)
                .collect(),
        }
    }
}

/// One catalog entry of the static permission surface.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/available-permission-response.ts"
)]
pub struct AvailablePermissionResponse {
    pub resource: String,
    pub actions: Vec<String>,
}

/// API representation of default-group seeding results.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/seed-default-groups-response.ts"
)]
pub struct SeedDefaultGroupsResponse {
    pub created: Vec<String>,
}

/// API representation of an entity's scope-evaluation attributes.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/resource-context-response.ts"
)]
pub struct ResourceContextResponse {
    pub entity_id: Option<String>,
    pub owner_id: Option<String>,
    pub assigned_to: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
}

impl From<ResourceContext> for ResourceContextResponse {
    fn from(value: ResourceContext) -> Self {
        Self {
            entity_id: value.entity_id,
            owner_id: value.owner_id,
            assigned_to: value.assigned_to,
            tags: value.tags.map(|tags| tags.into_iter().collect()),
            category: value.category,
        }
    }
}
