//! Application services and ports for the authorization core.

#![forbid(unsafe_code)]

mod audit;
mod group_admin_service;
mod permission_ports;
mod permission_service;
mod tenant_access_service;

pub use audit::{AuditEvent, AuditRepository};
pub use group_admin_service::{DEFAULT_GROUP_NAMES, GroupAdminService, UserPermissionSummary};
pub use permission_ports::{
    CreateGroupInput, GroupAdminRepository, GroupMembership, OverrideAdminRepository,
    OverrideRecord, PermissionGroupRecord, PermissionQueryRepository, UpdateGroupInput,
};
pub use permission_service::{PermissionDecision, PermissionService};
pub use tenant_access_service::{EntityDirectory, TenantAccessService};
