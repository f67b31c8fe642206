use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a permission grant is issued.
    GrantCreated,
    /// Emitted when a permission grant is deactivated.
    GrantDeactivated,
    /// Emitted when the validity window of a grant changes.
    GrantValidityUpdated,
    /// Emitted when a user asks for access.
    PermissionRequestSubmitted,
    /// Emitted when an administrator approves a request.
    PermissionRequestApproved,
    /// Emitted when an administrator rejects a request.
    PermissionRequestRejected,
    /// Emitted when classification nodes are imported.
    ClassificationTreeImported,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrantCreated => "classification.grant.created",
            Self::GrantDeactivated => "classification.grant.deactivated",
            Self::GrantValidityUpdated => "classification.grant.validity_updated",
            Self::PermissionRequestSubmitted => "classification.request.submitted",
            Self::PermissionRequestApproved => "classification.request.approved",
            Self::PermissionRequestRejected => "classification.request.rejected",
            Self::ClassificationTreeImported => "classification.tree.imported",
        }
    }
}
