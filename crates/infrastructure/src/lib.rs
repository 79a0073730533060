//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_permission_repository;
mod postgres_audit_repository;
mod postgres_entity_directory;
mod postgres_permission_repository;

pub use in_memory_permission_repository::InMemoryPermissionRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_entity_directory::PostgresEntityDirectory;
pub use postgres_permission_repository::PostgresPermissionRepository;
