use tessera_application::{GroupAdminService, PermissionService, TenantAccessService};
use tessera_core::OrganizationId;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub permission_service: PermissionService,
    pub group_admin_service: GroupAdminService,
    pub tenant_access_service: TenantAccessService,
    pub frontend_url: String,
    pub provisioning_token: String,
    pub default_organization_id: Option<OrganizationId>,
}
