mod common;
mod permissions;

pub use common::{HealthResponse, UserIdentityResponse};
pub use permissions::{
    AddGroupMemberRequest, AvailablePermissionResponse, CreatePermissionGroupRequest,
    EffectivePermissionResponse, GroupMembershipResponse, OverrideEntryRequest, OverrideResponse,
    PermissionDecisionResponse, PermissionGrantRequest, PermissionGrantResponse,
    PermissionGroupResponse, ResourceContextResponse, ScopeRequest, ScopeResponse,
    SeedDefaultGroupsRequest, SeedDefaultGroupsResponse, UpdatePermissionGroupRequest,
    UserPermissionSummaryResponse,
};
