//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod cached_classification_tree_repository;
mod in_memory_classification_tree_repository;
mod postgres_audit_repository;
mod postgres_classification_tree_repository;
mod postgres_error;
mod postgres_permission_grant_repository;
mod postgres_permission_request_repository;

pub use cached_classification_tree_repository::CachedClassificationTreeRepository;
pub use in_memory_classification_tree_repository::InMemoryClassificationTreeRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_classification_tree_repository::PostgresClassificationTreeRepository;
pub use postgres_permission_grant_repository::PostgresPermissionGrantRepository;
pub use postgres_permission_request_repository::PostgresPermissionRequestRepository;
