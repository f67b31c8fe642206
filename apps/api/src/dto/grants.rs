use classgate_domain::PermissionGrant;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::timestamp;

/// Incoming payload for grant creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-grant-request.ts"
)]
pub struct CreateGrantRequest {
    pub subject: String,
    pub code: String,
    pub role: String,
    #[serde(default)]
    pub include_children: bool,
    /// RFC 3339 instant; defaults to now.
    pub valid_from: Option<String>,
    /// RFC 3339 instant; omitted for open-ended grants.
    pub valid_until: Option<String>,
}

/// Incoming payload for validity window edits.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-grant-validity-request.ts"
)]
pub struct UpdateGrantValidityRequest {
    pub valid_from: String,
    pub valid_until: Option<String>,
}

/// API representation of a permission grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grant-response.ts"
)]
pub struct GrantResponse {
    pub grant_id: String,
    pub subject: String,
    pub code: String,
    pub role: String,
    pub include_children: bool,
    pub valid_from: String,
    pub valid_until: Option<String>,
    pub is_active: bool,
    pub granted_by: Option<String>,
}

impl From<PermissionGrant> for GrantResponse {
    fn from(grant: PermissionGrant) -> Self {
        Self {
            grant_id: grant.grant_id().to_string(),
            subject: grant.subject().to_owned(),
            code: grant.code().as_str().to_owned(),
            role: grant.role().as_str().to_owned(),
            include_children: grant.include_children(),
            valid_from: timestamp(grant.validity().valid_from()),
            valid_until: grant.validity().valid_until().map(timestamp),
            is_active: grant.is_active(),
            granted_by: grant.granted_by().map(ToOwned::to_owned),
        }
    }
}
