use std::sync::Arc;

use async_trait::async_trait;
use tessera_core::{AppError, AppResult, OrganizationId, UserIdentity};
use tessera_domain::{EntityKind, ResourceContext};

/// Port for organization-scoped entity lookups.
///
/// Implementations must select by id AND organization in one query; the
/// existence check never fetches entity data.
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    /// Returns whether an entity exists inside the organization.
    async fn exists_in_organization(
        &self,
        kind: EntityKind,
        entity_id: &str,
        organization_id: OrganizationId,
    ) -> AppResult<bool>;

    /// Loads scope-evaluation attributes for an entity inside the
    /// organization, when it exists there.
    async fn find_context(
        &self,
        kind: EntityKind,
        entity_id: &str,
        organization_id: OrganizationId,
    ) -> AppResult<Option<ResourceContext>>;
}

/// Application service enforcing object-level tenant isolation.
///
/// A lookup miss and a hit under a foreign organization produce the same
/// "not found" outcome, so a caller probing ids learns nothing about other
/// tenants' data.
#[derive(Clone)]
pub struct TenantAccessService {
    directory: Arc<dyn EntityDirectory>,
}

impl TenantAccessService {
    /// Creates a new service from a directory implementation.
    #[must_use]
    pub fn new(directory: Arc<dyn EntityDirectory>) -> Self {
        Self { directory }
    }

    /// Verifies that an entity referenced by id belongs to the actor's
    /// organization.
    pub async fn ensure_entity_access(
        &self,
        actor: &UserIdentity,
        kind: EntityKind,
        entity_id: &str,
    ) -> AppResult<()> {
        let exists = self
            .directory
            .exists_in_organization(kind, entity_id, actor.organization_id())
            .await?;

        if exists {
            return Ok(());
        }

        tracing::warn!(
            subject = actor.subject(),
            organization_id = %actor.organization_id(),
            entity_kind = kind.as_str(),
            entity_id,
            "cross-organization entity access blocked"
        );

        Err(not_found(kind, entity_id))
    }

    /// Loads the scope-evaluation context for an entity in the actor's
    /// organization; a foreign-organization hit is indistinguishable from a
    /// miss.
    pub async fn resource_context(
        &self,
        actor: &UserIdentity,
        kind: EntityKind,
        entity_id: &str,
    ) -> AppResult<ResourceContext> {
        match self
            .directory
            .find_context(kind, entity_id, actor.organization_id())
            .await?
        {
            Some(context) => Ok(context),
            None => {
                tracing::warn!(
                    subject = actor.subject(),
                    organization_id = %actor.organization_id(),
                    entity_kind = kind.as_str(),
                    entity_id,
                    "cross-organization entity access blocked"
                );

                Err(not_found(kind, entity_id))
            }
        }
    }
}

// The message never reveals whether the id exists under another tenant.
fn not_found(kind: EntityKind, entity_id: &str) -> AppError {
    AppError::NotFound(format!("{kind} '{entity_id}' was not found"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tessera_core::{AppError, AppResult, OrganizationId, UserIdentity};
    use tessera_domain::{EntityKind, ResourceContext};

    use super::{EntityDirectory, TenantAccessService};

    struct FakeEntityDirectory {
        entities: HashMap<(EntityKind, String), (OrganizationId, ResourceContext)>,
    }

    #[async_trait]
    impl EntityDirectory for FakeEntityDirectory {
        async fn exists_in_organization(
            &self,
            kind: EntityKind,
            entity_id: &str,
            organization_id: OrganizationId,
        ) -> AppResult<bool> {
            Ok(self
                .entities
                .get(&(kind, entity_id.to_owned()))
                .is_some_and(|(owner_org, _)| *owner_org == organization_id))
        }

        async fn find_context(
            &self,
            kind: EntityKind,
            entity_id: &str,
            organization_id: OrganizationId,
        ) -> AppResult<Option<ResourceContext>> {
            Ok(self
                .entities
                .get(&(kind, entity_id.to_owned()))
                .filter(|(owner_org, _)| *owner_org == organization_id)
                .map(|(_, context)| context.clone()))
        }
    }

    fn directory_with(
        kind: EntityKind,
        entity_id: &str,
        organization_id: OrganizationId,
    ) -> TenantAccessService {
        TenantAccessService::new(Arc::new(FakeEntityDirectory {
            entities: HashMap::from([(
                (kind, entity_id.to_owned()),
                (organization_id, ResourceContext::default()),
            )]),
        }))
    }

    #[tokio::test]
    async fn entity_in_own_organization_passes() {
        let organization_id = OrganizationId::new();
        let actor = UserIdentity::new("alice", "alice", None, organization_id);
        let service = directory_with(EntityKind::Risk, "risk-1", organization_id);

        let result = service
            .ensure_entity_access(&actor, EntityKind::Risk, "risk-1")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn foreign_organization_entity_is_reported_as_not_found() {
        let other_organization = OrganizationId::new();
        let actor = UserIdentity::new("alice", "alice", None, OrganizationId::new());
        let service = directory_with(EntityKind::Risk, "risk-1", other_organization);

        let result = service
            .ensure_entity_access(&actor, EntityKind::Risk, "risk-1")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn missing_entity_and_foreign_entity_share_the_same_error_shape() {
        let other_organization = OrganizationId::new();
        let actor = UserIdentity::new("alice", "alice", None, OrganizationId::new());
        let service = directory_with(EntityKind::Control, "ctl-1", other_organization);

        let foreign = service
            .ensure_entity_access(&actor, EntityKind::Control, "ctl-1")
            .await;
        let absent = service
            .ensure_entity_access(&actor, EntityKind::Control, "ctl-2")
            .await;

        let foreign_message = match foreign {
            Err(AppError::NotFound(message)) => message,
            other => panic!("expected not found, got {other:?}"),
        };
        let absent_message = match absent {
            Err(AppError::NotFound(message)) => message,
            other => panic!("expected not found, got {other:?}"),
        };

        // Same wording apart from the id, so existence elsewhere leaks nothing.
        assert_eq!(
            foreign_message.replace("ctl-1", "{id}"),
            absent_message.replace("ctl-2", "{id}")
        );
    }

    #[tokio::test]
    async fn context_lookup_hides_foreign_entities() {
        let other_organization = OrganizationId::new();
        let actor = UserIdentity::new("alice", "alice", None, OrganizationId::new());
        let service = directory_with(EntityKind::Vendor, "vendor-1", other_organization);

        let result = service
            .resource_context(&actor, EntityKind::Vendor, "vendor-1")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
