use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use tessera_application::EntityDirectory;
use tessera_core::{AppError, AppResult, OrganizationId};
use tessera_domain::{EntityKind, ResourceContext};

/// PostgreSQL-backed entity directory for tenant ownership checks.
///
/// Every query filters by organization in the same statement as the id, so a
/// record under another organization can never match.
#[derive(Clone)]
pub struct PostgresEntityDirectory {
    pool: PgPool,
}

impl PostgresEntityDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ContextRow {
    owner_id: Option<String>,
    assigned_to: Option<String>,
    tags: Option<Vec<String>>,
    category: Option<String>,
}

// Each guarded kind maps to exactly one table; adding a kind fails to compile
// until it gets an arm here.
fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Risk => "risks",
        EntityKind::Control => "controls",
        EntityKind::Evidence => "evidence_items",
        EntityKind::Policy => "policies",
        EntityKind::Vendor => "vendors",
        EntityKind::Asset => "assets",
        EntityKind::Audit => "audits",
        EntityKind::User => "organization_members",
        EntityKind::Workspace => "workspaces",
        EntityKind::Integration => "integrations",
        EntityKind::Framework => "frameworks",
        EntityKind::Report => "reports",
    }
}

#[async_trait]
impl EntityDirectory for PostgresEntityDirectory {
    async fn exists_in_organization(
        &self,
        kind: EntityKind,
        entity_id: &str,
        organization_id: OrganizationId,
    ) -> AppResult<bool> {
        // A malformed id cannot reference any stored entity.
        let Ok(entity_uuid) = uuid::Uuid::from_str(entity_id) else {
            return Ok(false);
        };

        let found = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            SELECT COUNT(*)
            FROM {}
            WHERE organization_id = $1
                AND id = $2
            "#,
            table_for(kind)
        ))
        .bind(organization_id.as_uuid())
        .bind(entity_uuid)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to check {kind} existence: {error}"))
        })?;

        Ok(found > 0)
    }

    async fn find_context(
        &self,
        kind: EntityKind,
        entity_id: &str,
        organization_id: OrganizationId,
    ) -> AppResult<Option<ResourceContext>> {
        let Ok(entity_uuid) = uuid::Uuid::from_str(entity_id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, ContextRow>(&format!(
            r#"
            SELECT
                owner_id,
                assigned_to,
                tags,
                category
            FROM {}
            WHERE organization_id = $1
                AND id = $2
            "#,
            table_for(kind)
        ))
        .bind(organization_id.as_uuid())
        .bind(entity_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load {kind} context: {error}"))
        })?;

        Ok(row.map(|row| ResourceContext {
            entity_id: Some(entity_id.to_owned()),
            owner_id: row.owner_id,
            assigned_to: row.assigned_to,
            tags: row.tags.map(|tags| tags.into_iter().collect::<BTreeSet<_>>()),
            category: row.category,
        }))
    }
}
