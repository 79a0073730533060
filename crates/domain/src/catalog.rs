use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_core::AppError;

/// Protected resource categories enforced by authorization checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Compliance controls and their implementation state.
    Controls,
    /// Evidence artifacts attached to controls and audits.
    Evidence,
    /// Governance policy documents.
    Policies,
    /// Risk register entries.
    Risk,
    /// Third-party vendor records.
    Vendors,
    /// Audit engagements and findings.
    Audits,
    /// Organization member accounts.
    Users,
    /// Permission groups, memberships and overrides.
    Permissions,
    /// Organization-level settings.
    Settings,
    /// Collaboration workspaces.
    Workspaces,
    /// Business continuity and disaster recovery plans.
    Bcdr,
    /// Compliance reports.
    Reports,
    /// AI assistant features.
    Ai,
}

impl Resource {
    /// Returns a stable storage value for this resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Controls => "controls",
            Self::Evidence => "evidence",
            Self::Policies => "policies",
            Self::Risk => "risk",
            Self::Vendors => "vendors",
            Self::Audits => "audits",
            Self::Users => "users",
            Self::Permissions => "permissions",
            Self::Settings => "settings",
            Self::Workspaces => "workspaces",
            Self::Bcdr => "bcdr",
            Self::Reports => "reports",
            Self::Ai => "ai",
        }
    }

    /// Returns all known resources.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Resource] = &[
            Resource::Controls,
            Resource::Evidence,
            Resource::Policies,
            Resource::Risk,
            Resource::Vendors,
            Resource::Audits,
            Resource::Users,
            Resource::Permissions,
            Resource::Settings,
            Resource::Workspaces,
            Resource::Bcdr,
            Resource::Reports,
            Resource::Ai,
        ];

        ALL
    }

    /// Returns the actions this resource supports.
    #[must_use]
    pub fn supported_actions(&self) -> &'static [Action] {
        const CRUD: &[Action] = &[
            Action::Create,
            Action::Read,
            Action::Update,
            Action::Delete,
        ];

        match self {
            Self::Controls | Self::Evidence | Self::Risk | Self::Vendors | Self::Users
            | Self::Permissions | Self::Workspaces | Self::Bcdr => CRUD,
            Self::Policies => &[
                Action::Create,
                Action::Read,
                Action::Update,
                Action::Delete,
                Action::Approve,
            ],
            Self::Audits => &[
                Action::Create,
                Action::Read,
                Action::Update,
                Action::Delete,
                Action::Export,
            ],
            Self::Settings => &[Action::Read, Action::Update],
            Self::Reports => &[Action::Read, Action::Export],
            Self::Ai => &[Action::Read],
        }
    }
}

impl Display for Resource {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "controls" => Ok(Self::Controls),
            "evidence" => Ok(Self::Evidence),
            "policies" => Ok(Self::Policies),
            "risk" => Ok(Self::Risk),
            "vendors" => Ok(Self::Vendors),
            "audits" => Ok(Self::Audits),
            "users" => Ok(Self::Users),
            "permissions" => Ok(Self::Permissions),
            "settings" => Ok(Self::Settings),
            "workspaces" => Ok(Self::Workspaces),
            "bcdr" => Ok(Self::Bcdr),
            "reports" => Ok(Self::Reports),
            "ai" => Ok(Self::Ai),
            _ => Err(AppError::Validation(format!(
                "unknown resource value '{value}'"
            ))),
        }
    }
}

/// Operations a grant may allow on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create new records.
    Create,
    /// Read existing records.
    Read,
    /// Update existing records.
    Update,
    /// Delete existing records.
    Delete,
    /// Export records to external formats.
    Export,
    /// Approve records awaiting sign-off.
    Approve,
}

impl Action {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Approve => "approve",
        }
    }
}

impl Display for Action {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "export" => Ok(Self::Export),
            "approve" => Ok(Self::Approve),
            _ => Err(AppError::Validation(format!(
                "unknown action value '{value}'"
            ))),
        }
    }
}

/// A single `resource:action` pair, the storage key for user overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionKey {
    /// Resource half of the key.
    pub resource: Resource,
    /// Action half of the key.
    pub action: Action,
}

impl PermissionKey {
    /// Creates a key from its parts.
    #[must_use]
    pub fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for PermissionKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (resource, action) = value.split_once(':').ok_or_else(|| {
            AppError::Validation(format!(
                "permission '{value}' must use the 'resource:action' form"
            ))
        })?;

        Ok(Self {
            resource: Resource::from_str(resource)?,
            action: Action::from_str(action)?,
        })
    }
}
