use super::*;

use tessera_core::OrganizationId;
use tessera_domain::{AuditAction, OwnershipMode, PermissionGrant, Scope};

use crate::AuditEvent;
use crate::permission_ports::CreateGroupInput;

/// Names of the built-in groups materialized for every organization.
pub const DEFAULT_GROUP_NAMES: &[&str] = &["Administrator", "Contributor", "Viewer", "Auditor"];

struct DefaultGroup {
    name: &'static str,
    is_system: bool,
    permissions: Vec<PermissionGrant>,
}

// Administrator and Viewer are system groups; Contributor and Auditor are
// ordinary starting points organizations are expected to tailor.
fn default_groups() -> Vec<DefaultGroup> {
    let every_resource_full = Resource::all()
        .iter()
        .map(|resource| {
            PermissionGrant::new(
                *resource,
                resource.supported_actions().iter().copied(),
                Scope::unrestricted(),
            )
        })
        .collect();

    let every_resource_read = Resource::all()
        .iter()
        .map(|resource| PermissionGrant::new(*resource, [Action::Read], Scope::unrestricted()))
        .collect();

    let contributor = [
        Resource::Controls,
        Resource::Evidence,
        Resource::Policies,
        Resource::Risk,
        Resource::Vendors,
        Resource::Workspaces,
    ]
    .into_iter()
    .map(|resource| {
        PermissionGrant::new(
            resource,
            [Action::Create, Action::Read, Action::Update],
            Scope::with_ownership(OwnershipMode::Assigned),
        )
    })
    .chain(std::iter::once(PermissionGrant::new(
        Resource::Reports,
        [Action::Read],
        Scope::unrestricted(),
    )))
    .collect();

    let auditor = Resource::all()
        .iter()
        .map(|resource| PermissionGrant::new(*resource, [Action::Read], Scope::unrestricted()))
        .chain([
            PermissionGrant::new(Resource::Audits, [Action::Export], Scope::unrestricted()),
            PermissionGrant::new(Resource::Reports, [Action::Export], Scope::unrestricted()),
        ])
        .collect();

    vec![
        DefaultGroup {
            name: "Administrator",
            is_system: true,
            permissions: every_resource_full,
        },
        DefaultGroup {
            name: "Contributor",
            is_system: false,
            permissions: contributor,
        },
        DefaultGroup {
            name: "Viewer",
            is_system: true,
            permissions: every_resource_read,
        },
        DefaultGroup {
            name: "Auditor",
            is_system: false,
            permissions: auditor,
        },
    ]
}

impl GroupAdminService {
    /// Idempotently creates the built-in default groups for an organization.
    ///
    /// Seeding is by name: a group is created only when no group of that name
    /// exists, so a same-named group an administrator has since edited or
    /// repurposed is never overwritten. Returns the names actually created.
    pub async fn seed_default_groups(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<String>> {
        let mut created = Vec::new();

        for default in default_groups() {
            if self
                .groups
                .find_group_by_name(organization_id, default.name)
                .await?
                .is_some()
            {
                continue;
            }

            self.groups
                .create_group(
                    organization_id,
                    CreateGroupInput {
                        name: default.name.to_owned(),
                        permissions: default.permissions,
                    },
                    default.is_system,
                )
                .await?;

            created.push(default.name.to_owned());
        }

        if !created.is_empty() {
            self.audit_repository
                .append_event(AuditEvent {
                    organization_id,
                    subject: "system".to_owned(),
                    action: AuditAction::PermissionGroupsSeeded,
                    resource_type: "permission_group".to_owned(),
                    resource_id: organization_id.to_string(),
                    detail: Some(format!("seeded default groups: {}", created.join(", "))),
                })
                .await?;
        }

        Ok(created)
    }
}
