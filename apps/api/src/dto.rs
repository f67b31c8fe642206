use chrono::{DateTime, SecondsFormat, Utc};

mod access;
mod classification;
mod common;
mod grants;
mod permission_requests;

pub use access::{AccessCheckResponse, AllowedCodesResponse, EffectiveRoleResponse};
pub use classification::{
    CatalogEntryResponse, ClassificationNodeInput, ClassificationNodeResponse,
    DescendantCodesResponse, ImportClassificationTreeRequest, ImportClassificationTreeResponse,
};
pub use common::{BootstrapSessionRequest, HealthResponse, UserIdentityResponse};
pub use grants::{CreateGrantRequest, GrantResponse, UpdateGrantValidityRequest};
pub use permission_requests::{
    ApprovePermissionRequestResponse, DecidePermissionRequestRequest, PermissionRequestResponse,
    SubmitPermissionRequestRequest,
};

/// Formats an instant for transport.
pub fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}
