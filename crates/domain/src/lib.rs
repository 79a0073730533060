//! Domain entities and invariants for the authorization core.

#![forbid(unsafe_code)]

mod audit;
mod catalog;
mod entity;
mod grant;
mod scope;

pub use audit::AuditAction;
pub use catalog::{Action, PermissionKey, Resource};
pub use entity::EntityKind;
pub use grant::{EffectivePermission, PermissionGrant, PermissionSource};
pub use scope::{OwnershipMode, ResourceContext, Scope};
