//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod access_resolver;
mod audit_ports;
mod classification_catalog_service;
mod grant_admin_service;
mod permission_request_ports;
mod permission_request_service;

#[cfg(test)]
mod test_support;

pub use access_ports::{ClassificationTreeRepository, PermissionGrantRepository};
pub use access_resolver::ClassificationAccessResolver;
pub use audit_ports::{AuditEvent, AuditRepository};
pub use classification_catalog_service::{CatalogEntry, ClassificationCatalogService};
pub use grant_admin_service::{
    CreateGrantInput, GrantAdminService, GrantIssue, UpdateValidityInput,
};
pub use permission_request_ports::{PermissionRequestQuery, PermissionRequestRepository};
pub use permission_request_service::{PermissionRequestService, SubmitPermissionRequestInput};
