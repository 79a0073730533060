use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Action, Resource, Scope};

/// A single grant statement: within `scope`, `actions` on `resource` are
/// allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Resource the grant applies to.
    pub resource: Resource,
    /// Actions allowed by the grant.
    pub actions: BTreeSet<Action>,
    /// Restriction narrowing the grant.
    #[serde(default)]
    pub scope: Scope,
}

impl PermissionGrant {
    /// Creates a grant from a resource, action list and scope.
    #[must_use]
    pub fn new(resource: Resource, actions: impl IntoIterator<Item = Action>, scope: Scope) -> Self {
        Self {
            resource,
            actions: actions.into_iter().collect(),
            scope,
        }
    }
}

/// Origin of an effective permission entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    /// Derived from permission-group membership.
    Group,
    /// Adjusted by a per-user override.
    Override,
}

impl PermissionSource {
    /// Returns a stable transport value for this source.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Override => "override",
        }
    }
}

/// Resolved per-user, per-resource permission entry.
///
/// Computed fresh for every evaluation and never persisted or cached across
/// requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermission {
    /// Resource the entry applies to.
    pub resource: Resource,
    /// Allowed actions after merging all grant sources.
    pub actions: BTreeSet<Action>,
    /// Applicable scope after merging all grant sources.
    pub scope: Scope,
    /// Whether a group or an override produced the entry.
    pub source: PermissionSource,
    /// First group contributing to the entry, for display only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}
