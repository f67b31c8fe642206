//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access_role;
mod audit;
mod classification;
mod classification_tree;
mod permission_grant;
mod permission_request;

pub use access_role::AccessRole;
pub use audit::AuditAction;
pub use classification::{CLASSIFICATION_CODE_MAX_LENGTH, ClassificationCode, ClassificationNode};
pub use classification_tree::ClassificationTreeIndex;
pub use permission_grant::{GrantId, PermissionGrant, ValidityWindow};
pub use permission_request::{PermissionRequest, PermissionRequestId, PermissionRequestStatus};
