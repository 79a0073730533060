use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_core::AppError;

use crate::Resource;

/// Business entity kinds the tenant ownership guard can verify.
///
/// Each kind maps to one lookup implementation in the entity directory, so
/// adding a kind forces the compiler to surface every match that needs a new
/// arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Risk register entry.
    Risk,
    /// Compliance control.
    Control,
    /// Evidence artifact.
    Evidence,
    /// Policy document.
    Policy,
    /// Vendor record.
    Vendor,
    /// Asset inventory record.
    Asset,
    /// Audit engagement.
    Audit,
    /// Organization member.
    User,
    /// Collaboration workspace.
    Workspace,
    /// Third-party integration.
    Integration,
    /// Compliance framework.
    Framework,
    /// Generated report.
    Report,
}

impl EntityKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Control => "control",
            Self::Evidence => "evidence",
            Self::Policy => "policy",
            Self::Vendor => "vendor",
            Self::Asset => "asset",
            Self::Audit => "audit",
            Self::User => "user",
            Self::Workspace => "workspace",
            Self::Integration => "integration",
            Self::Framework => "framework",
            Self::Report => "report",
        }
    }

    /// Returns the entity kind guarding instances of a protected resource,
    /// when the resource is backed by per-instance records.
    #[must_use]
    pub fn for_resource(resource: Resource) -> Option<Self> {
        match resource {
            Resource::Risk => Some(Self::Risk),
            Resource::Controls => Some(Self::Control),
            Resource::Evidence => Some(Self::Evidence),
            Resource::Policies => Some(Self::Policy),
            Resource::Vendors => Some(Self::Vendor),
            Resource::Audits => Some(Self::Audit),
            Resource::Users => Some(Self::User),
            Resource::Workspaces => Some(Self::Workspace),
            Resource::Reports => Some(Self::Report),
            Resource::Permissions | Resource::Settings | Resource::Bcdr | Resource::Ai => None,
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "risk" => Ok(Self::Risk),
            "control" => Ok(Self::Control),
            "evidence" => Ok(Self::Evidence),
            "policy" => Ok(Self::Policy),
            "vendor" => Ok(Self::Vendor),
            "asset" => Ok(Self::Asset),
            "audit" => Ok(Self::Audit),
            "user" => Ok(Self::User),
            "workspace" => Ok(Self::Workspace),
            "integration" => Ok(Self::Integration),
            "framework" => Ok(Self::Framework),
            "report" => Ok(Self::Report),
            _ => Err(AppError::Validation(format!(
                "unknown entity kind '{value}'"
            ))),
        }
    }
}
