use async_trait::async_trait;

use classgate_core::AppResult;
use classgate_domain::{
    ClassificationCode, PermissionRequest, PermissionRequestId, PermissionRequestStatus,
};

/// Query parameters for permission request listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequestQuery {
    /// Optional requester filter.
    pub subject: Option<String>,
    /// Optional status filter.
    pub status: Option<PermissionRequestStatus>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for pagination.
    pub offset: usize,
}

/// Repository port for permission requests.
#[async_trait]
pub trait PermissionRequestRepository: Send + Sync {
    /// Persists a new pending request.
    async fn create_request(&self, request: PermissionRequest) -> AppResult<PermissionRequest>;

    /// Finds one request by identifier.
    async fn find_request(
        &self,
        request_id: PermissionRequestId,
    ) -> AppResult<Option<PermissionRequest>>;

    /// Finds the pending request of a subject for a code, if any.
    async fn find_pending_request(
        &self,
        subject: &str,
        code: &ClassificationCode,
    ) -> AppResult<Option<PermissionRequest>>;

    /// Lists requests, newest first.
    async fn list_requests(&self, query: PermissionRequestQuery)
    -> AppResult<Vec<PermissionRequest>>;

    /// Stores the decision of a request that is still pending in storage.
    ///
    /// Returns `Conflict` when another decision was stored first.
    async fn save_decision(&self, request: &PermissionRequest) -> AppResult<()>;
}
