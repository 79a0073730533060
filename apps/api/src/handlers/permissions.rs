use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use tessera_core::UserIdentity;

use crate::dto::{
    AddGroupMemberRequest, AvailablePermissionResponse, CreatePermissionGroupRequest,
    EffectivePermissionResponse, GroupMembershipResponse, OverrideEntryRequest, OverrideResponse,
    PermissionDecisionResponse, PermissionGrantRequest, PermissionGroupResponse,
    ResourceContextResponse, SeedDefaultGroupsRequest, SeedDefaultGroupsResponse,
    UpdatePermissionGroupRequest, UserPermissionSummaryResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod catalog;
mod check;
mod groups;
mod members;
mod overrides;
mod seed;


pub use catalog::{available_permissions_handler, my_permissions_handler};
pub use check::{check_permission_handler, entity_context_handler};
pub use groups::{
    create_group_handler, delete_group_handler, list_groups_handler, update_group_handler,
};
pub use members::{add_group_member_handler, list_group_members_handler, remove_group_member_handler};
pub use overrides::{
    get_user_overrides_handler, set_user_overrides_handler, user_permission_summary_handler,
};
pub use seed::seed_default_groups_handler;
