use classgate_domain::PermissionRequest;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{GrantResponse, timestamp};

/// Incoming payload for an access request.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/submit-permission-request-request.ts"
)]
pub struct SubmitPermissionRequestRequest {
    pub code: String,
    pub role: String,
    #[serde(default)]
    pub include_children: bool,
    pub reason: Option<String>,
}

/// Incoming payload for approving or rejecting a request.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/decide-permission-request-request.ts"
)]
pub struct DecidePermissionRequestRequest {
    pub note: Option<String>,
}

/// API representation of an access request.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-request-response.ts"
)]
pub struct PermissionRequestResponse {
    pub request_id: String,
    pub subject: String,
    pub code: String,
    pub role: String,
    pub include_children: bool,
    pub reason: Option<String>,
    pub status: String,
    pub decided_by: Option<String>,
    pub decision_note: Option<String>,
    pub requested_at: String,
}

impl From<PermissionRequest> for PermissionRequestResponse {
    fn from(request: PermissionRequest) -> Self {
        Self {
            request_id: request.request_id().to_string(),
            subject: request.subject().to_owned(),
            code: request.code().as_str().to_owned(),
            role: request.role().as_str().to_owned(),
            include_children: request.include_children(),
            reason: request.reason().map(ToOwned::to_owned),
            status: request.status().as_str().to_owned(),
            decided_by: request.decided_by().map(ToOwned::to_owned),
            decision_note: request.decision_note().map(ToOwned::to_owned),
            requested_at: timestamp(request.requested_at()),
        }
    }
}

/// Approved request together with the grant it produced.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/approve-permission-request-response.ts"
)]
pub struct ApprovePermissionRequestResponse {
    pub request: PermissionRequestResponse,
    pub grant: GrantResponse,
}
