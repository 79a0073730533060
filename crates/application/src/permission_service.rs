use std::collections::BTreeMap;
use std::sync::Arc;

use tessera_core::{AppError, AppResult, OrganizationId, UserIdentity};
use tessera_domain::{
    Action, EffectivePermission, PermissionKey, PermissionSource, Resource, ResourceContext, Scope,
};

use crate::permission_ports::{OverrideRecord, PermissionGroupRecord, PermissionQueryRepository};

/// Outcome of a single permission check.
///
/// Absence of permission is a normal negative result, never an error; callers
/// at the API boundary decide how to reject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDecision {
    /// Whether the action is permitted.
    pub allowed: bool,
    /// Human-readable explanation naming the granting source or the miss.
    pub reason: String,
    /// The effective entry that authorized the action, when allowed.
    pub matched: Option<EffectivePermission>,
}

/// Application service computing effective permissions per user.
///
/// Every check is computed fresh from current store contents; there is no
/// cross-request cache and therefore no invalidation concern.
#[derive(Clone)]
pub struct PermissionService {
    repository: Arc<dyn PermissionQueryRepository>,
}

impl PermissionService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn PermissionQueryRepository>) -> Self {
        Self { repository }
    }

    /// Resolves a user's effective permissions from group grants and
    /// per-user overrides.
    pub async fn effective_permissions(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
    ) -> AppResult<Vec<EffectivePermission>> {
        let groups = self
            .repository
            .groups_for_user(organization_id, user_id)
            .await?;
        let overrides = self
            .repository
            .overrides_for_user(organization_id, user_id)
            .await?;

        Ok(resolve_effective_permissions(&groups, &overrides))
    }

    /// Checks whether a user may perform an action, optionally evaluating
    /// grant scopes against a concrete resource instance.
    pub async fn check_permission(
        &self,
        organization_id: OrganizationId,
        user_id: &str,
        resource: Resource,
        action: Action,
        context: Option<&ResourceContext>,
    ) -> AppResult<PermissionDecision> {
        let effective = self
            .effective_permissions(organization_id, user_id)
            .await?;

        for entry in effective {
            if entry.resource != resource || !entry.actions.contains(&action) {
                continue;
            }

            // An entry that fails its scope does not short-circuit the check;
            // another entry for the resource might still authorize.
            if let Some(context) = context
                && !entry.scope.permits(context, user_id)
            {
                continue;
            }

            let reason = match entry.source {
                PermissionSource::Group => format!(
                    "granted via group '{}'",
                    entry.group_name.as_deref().unwrap_or("unknown")
                ),
                PermissionSource::Override => "granted via user override".to_owned(),
            };

            return Ok(PermissionDecision {
                allowed: true,
                reason,
                matched: Some(entry),
            });
        }

        Ok(PermissionDecision {
            allowed: false,
            reason: format!("no permission found for {resource}:{action}"),
            matched: None,
        })
    }

    /// Ensures the actor holds a permission, without scope context.
    pub async fn require_permission(
        &self,
        actor: &UserIdentity,
        resource: Resource,
        action: Action,
    ) -> AppResult<()> {
        let decision = self
            .check_permission(
                actor.organization_id(),
                actor.subject(),
                resource,
                action,
                None,
            )
            .await?;

        if decision.allowed {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' is missing permission '{resource}:{action}' in organization '{}'",
            actor.subject(),
            actor.organization_id()
        )))
    }
}

/// Merges group grants and user overrides into per-resource entries.
///
/// Groups are additive and permissive-merging; overrides are the
/// authoritative last word for their individual permission. Overrides are
/// applied in sorted key order, with the most recent write winning when the
/// input carries duplicates for one key.
fn resolve_effective_permissions(
    groups: &[PermissionGroupRecord],
    overrides: &[OverrideRecord],
) -> Vec<EffectivePermission> {
    let mut by_resource: BTreeMap<Resource, EffectivePermission> = BTreeMap::new();

    for group in groups {
        for grant in &group.permissions {
            match by_resource.get_mut(&grant.resource) {
                None => {
                    by_resource.insert(
                        grant.resource,
                        EffectivePermission {
                            resource: grant.resource,
                            actions: grant.actions.clone(),
                            scope: grant.scope.clone(),
                            source: PermissionSource::Group,
                            group_name: Some(group.name.clone()),
                        },
                    );
                }
                Some(entry) => {
                    entry.actions.extend(grant.actions.iter().copied());
                    entry.scope = entry.scope.merge_with(&grant.scope);
                    // First-seen group name is kept; it is display-only.
                }
            }
        }
    }

    let mut latest_by_key: BTreeMap<PermissionKey, &OverrideRecord> = BTreeMap::new();
    for record in overrides {
        latest_by_key.insert(record.permission, record);
    }

    for (key, record) in latest_by_key {
        if record.granted {
            let entry = by_resource
                .entry(key.resource)
                .or_insert_with(|| EffectivePermission {
                    resource: key.resource,
                    actions: std::collections::BTreeSet::new(),
                    scope: Scope::unrestricted(),
                    source: PermissionSource::Override,
                    group_name: None,
                });

            entry.actions.insert(key.action);
            if let Some(scope) = record.resource_scope.clone() {
                entry.scope = scope;
            }
            entry.source = PermissionSource::Override;
        } else if let Some(entry) = by_resource.get_mut(&key.resource) {
            entry.actions.remove(&key.action);
            if entry.actions.is_empty() {
                by_resource.remove(&key.resource);
            }
        }
    }

    by_resource.into_values().collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tessera_core::{AppError, AppResult, OrganizationId, UserIdentity};
    use tessera_domain::{
        Action, OwnershipMode, PermissionGrant, PermissionKey, PermissionSource, Resource,
        ResourceContext, Scope,
    };

    use super::{PermissionQueryRepository, PermissionService};
    use crate::permission_ports::{OverrideRecord, PermissionGroupRecord};

    #[derive(Default)]
    struct FakePermissionQueryRepository {
        groups: HashMap<(OrganizationId, String), Vec<PermissionGroupRecord>>,
        overrides: HashMap<(OrganizationId, String), Vec<OverrideRecord>>,
    }

    #[async_trait]
    impl PermissionQueryRepository for FakePermissionQueryRepository {
        async fn groups_for_user(
            &self,
            organization_id: OrganizationId,
            user_id: &str,
        ) -> AppResult<Vec<PermissionGroupRecord>> {
            Ok(self
                .groups
                .get(&(organization_id, user_id.to_owned()))
                .cloned()
                .unwrap_or_default())
        }

        async fn overrides_for_user(
            &self,
            organization_id: OrganizationId,
            user_id: &str,
        ) -> AppResult<Vec<OverrideRecord>> {
            Ok(self
                .overrides
                .get(&(organization_id, user_id.to_owned()))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn group(
        organization_id: OrganizationId,
        name: &str,
        permissions: Vec<PermissionGrant>,
    ) -> PermissionGroupRecord {
        PermissionGroupRecord {
            group_id: format!("group-{name}"),
            organization_id,
            name: name.to_owned(),
            is_system: false,
            permissions,
        }
    }

    fn service_with(
        organization_id: OrganizationId,
        user_id: &str,
        groups: Vec<PermissionGroupRecord>,
        overrides: Vec<OverrideRecord>,
    ) -> PermissionService {
        PermissionService::new(Arc::new(FakePermissionQueryRepository {
            groups: HashMap::from([((organization_id, user_id.to_owned()), groups)]),
            overrides: HashMap::from([((organization_id, user_id.to_owned()), overrides)]),
        }))
    }

    #[tokio::test]
    async fn group_union_keeps_most_permissive_scope() {
        let organization_id = OrganizationId::new();
        let service = service_with(
            organization_id,
            "u1",
            vec![
                group(
                    organization_id,
                    "Viewer",
                    vec![PermissionGrant::new(
                        Resource::Controls,
                        [Action::Read],
                        Scope::unrestricted(),
                    )],
                ),
                group(
                    organization_id,
                    "Editor",
                    vec![PermissionGrant::new(
                        Resource::Controls,
                        [Action::Read, Action::Update],
                        Scope::with_ownership(OwnershipMode::Owned),
                    )],
                ),
            ],
            Vec::new(),
        );

        let effective = match service.effective_permissions(organization_id, "u1").await {
            Ok(effective) => effective,
            Err(error) => panic!("evaluation should succeed: {error}"),
        };

        assert_eq!(effective.len(), 1);
        let entry = &effective[0];
        assert_eq!(entry.resource, Resource::Controls);
        assert!(entry.actions.contains(&Action::Read));
        assert!(entry.actions.contains(&Action::Update));
        assert_eq!(entry.scope.ownership, OwnershipMode::All);
        assert_eq!(entry.source, PermissionSource::Group);
        assert_eq!(entry.group_name.as_deref(), Some("Viewer"));
    }

    #[tokio::test]
    async fn merged_all_scope_permits_foreign_owner_update() {
        let organization_id = OrganizationId::new();
        let service = service_with(
            organization_id,
            "u1",
            vec![
                group(
                    organization_id,
                    "Viewer",
                    vec![PermissionGrant::new(
                        Resource::Controls,
                        [Action::Read],
                        Scope::unrestricted(),
                    )],
                ),
                group(
                    organization_id,
                    "Editor",
                    vec![PermissionGrant::new(
                        Resource::Controls,
                        [Action::Read, Action::Update],
                        Scope::with_ownership(OwnershipMode::Owned),
                    )],
                ),
            ],
            Vec::new(),
        );

        let context = ResourceContext {
            owner_id: Some("other".to_owned()),
            ..ResourceContext::default()
        };
        let decision = match service
            .check_permission(
                organization_id,
                "u1",
                Resource::Controls,
                Action::Update,
                Some(&context),
            )
            .await
        {
            Ok(decision) => decision,
            Err(error) => panic!("check should succeed: {error}"),
        };

        assert!(decision.allowed);
        assert!(decision.reason.contains("Viewer"));
    }

    #[tokio::test]
    async fn denying_override_subtracts_group_action() {
        let organization_id = OrganizationId::new();
        let service = service_with(
            organization_id,
            "u1",
            vec![group(
                organization_id,
                "Editor",
                vec![PermissionGrant::new(
                    Resource::Risk,
                    [Action::Read, Action::Update],
                    Scope::unrestricted(),
                )],
            )],
            vec![OverrideRecord {
                user_id: "u1".to_owned(),
                permission: PermissionKey::new(Resource::Risk, Action::Update),
                granted: false,
                resource_scope: None,
            }],
        );

        let effective = match service.effective_permissions(organization_id, "u1").await {
            Ok(effective) => effective,
            Err(error) => panic!("evaluation should succeed: {error}"),
        };

        assert_eq!(effective.len(), 1);
        assert!(effective[0].actions.contains(&Action::Read));
        assert!(!effective[0].actions.contains(&Action::Update));
    }

    #[tokio::test]
    async fn denying_override_cannot_introduce_a_resource_entry() {
        let organization_id = OrganizationId::new();
        let service = service_with(
            organization_id,
            "u1",
            Vec::new(),
            vec![OverrideRecord {
                user_id: "u1".to_owned(),
                permission: PermissionKey::new(Resource::Risk, Action::Read),
                granted: false,
                resource_scope: None,
            }],
        );

        let effective = match service.effective_permissions(organization_id, "u1").await {
            Ok(effective) => effective,
            Err(error) => panic!("evaluation should succeed: {error}"),
        };

        assert!(effective.is_empty());
    }

    #[tokio::test]
    async fn denying_override_removes_entry_when_actions_empty() {
        let organization_id = OrganizationId::new();
        let service = service_with(
            organization_id,
            "u1",
            vec![group(
                organization_id,
                "Viewer",
                vec![PermissionGrant::new(
                    Resource::Reports,
                    [Action::Read],
                    Scope::unrestricted(),
                )],
            )],
            vec![OverrideRecord {
                user_id: "u1".to_owned(),
                permission: PermissionKey::new(Resource::Reports, Action::Read),
                granted: false,
                resource_scope: None,
            }],
        );

        let effective = match service.effective_permissions(organization_id, "u1").await {
            Ok(effective) => effective,
            Err(error) => panic!("evaluation should succeed: {error}"),
        };

        assert!(effective.is_empty());
    }

    #[tokio::test]
    async fn granting_override_introduces_entry_with_replaced_scope() {
        let organization_id = OrganizationId::new();
        let service = service_with(
            organization_id,
            "u1",
            Vec::new(),
            vec![OverrideRecord {
                user_id: "u1".to_owned(),
                permission: PermissionKey::new(Resource::Risk, Action::Read),
                granted: true,
                resource_scope: Some(Scope {
                    ownership: OwnershipMode::Owned,
                    tags: Some(std::iter::once("pci".to_owned()).collect()),
                    categories: None,
                }),
            }],
        );

        let owned_and_tagged = ResourceContext {
            owner_id: Some("u1".to_owned()),
            tags: Some(std::iter::once("pci".to_owned()).collect()),
            ..ResourceContext::default()
        };
        let foreign = ResourceContext {
            owner_id: Some("other".to_owned()),
            tags: Some(std::iter::once("pci".to_owned()).collect()),
            ..ResourceContext::default()
        };

        let allowed = match service
            .check_permission(
                organization_id,
                "u1",
                Resource::Risk,
                Action::Read,
                Some(&owned_and_tagged),
            )
            .await
        {
            Ok(decision) => decision,
            Err(error) => panic!("check should succeed: {error}"),
        };
        let denied = match service
            .check_permission(
                organization_id,
                "u1",
                Resource::Risk,
                Action::Read,
                Some(&foreign),
            )
            .await
        {
            Ok(decision) => decision,
            Err(error) => panic!("check should succeed: {error}"),
        };

        assert!(allowed.allowed);
        assert_eq!(allowed.reason, "granted via user override");
        assert!(!denied.allowed);
    }

    #[tokio::test]
    async fn granting_override_without_scope_defaults_to_unrestricted() {
        let organization_id = OrganizationId::new();
        let service = service_with(
            organization_id,
            "u1",
            Vec::new(),
            vec![OverrideRecord {
                user_id: "u1".to_owned(),
                permission: PermissionKey::new(Resource::Evidence, Action::Create),
                granted: true,
                resource_scope: None,
            }],
        );

        let effective = match service.effective_permissions(organization_id, "u1").await {
            Ok(effective) => effective,
            Err(error) => panic!("evaluation should succeed: {error}"),
        };

        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].scope, Scope::unrestricted());
        assert_eq!(effective[0].source, PermissionSource::Override);
    }

    #[tokio::test]
    async fn duplicate_overrides_for_one_key_resolve_to_latest_write() {
        let organization_id = OrganizationId::new();
        let key = PermissionKey::new(Resource::Vendors, Action::Read);
        let service = service_with(
            organization_id,
            "u1",
            Vec::new(),
            vec![
                OverrideRecord {
                    user_id: "u1".to_owned(),
                    permission: key,
                    granted: true,
                    resource_scope: None,
                },
                // Repository orders by write time; the later denial wins.
                OverrideRecord {
                    user_id: "u1".to_owned(),
                    permission: key,
                    granted: false,
                    resource_scope: None,
                },
            ],
        );

        let effective = match service.effective_permissions(organization_id, "u1").await {
            Ok(effective) => effective,
            Err(error) => panic!("evaluation should succeed: {error}"),
        };

        assert!(effective.is_empty());
    }

    #[tokio::test]
    async fn missing_permission_yields_soft_denial() {
        let organization_id = OrganizationId::new();
        let service = service_with(organization_id, "u1", Vec::new(), Vec::new());

        let decision = match service
            .check_permission(organization_id, "u1", Resource::Audits, Action::Export, None)
            .await
        {
            Ok(decision) => decision,
            Err(error) => panic!("check should succeed: {error}"),
        };

        assert!(!decision.allowed);
        assert_eq!(decision.reason, "no permission found for audits:export");
        assert!(decision.matched.is_none());
    }

    #[tokio::test]
    async fn scope_failing_entry_denies_without_erroring() {
        let organization_id = OrganizationId::new();
        let service = service_with(
            organization_id,
            "u1",
            vec![group(
                organization_id,
                "Owners",
                vec![PermissionGrant::new(
                    Resource::Policies,
                    [Action::Update],
                    Scope::with_ownership(OwnershipMode::Owned),
                )],
            )],
            Vec::new(),
        );

        let context = ResourceContext {
            owner_id: Some("someone-else".to_owned()),
            ..ResourceContext::default()
        };
        let decision = match service
            .check_permission(
                organization_id,
                "u1",
                Resource::Policies,
                Action::Update,
                Some(&context),
            )
            .await
        {
            Ok(decision) => decision,
            Err(error) => panic!("check should succeed: {error}"),
        };

        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn require_permission_maps_denial_to_forbidden() {
        let organization_id = OrganizationId::new();
        let actor = UserIdentity::new("u1", "u1", None, organization_id);
        let service = service_with(organization_id, "u1", Vec::new(), Vec::new());

        let result = service
            .require_permission(&actor, Resource::Permissions, Action::Update)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
