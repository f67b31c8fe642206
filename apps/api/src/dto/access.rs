use serde::Serialize;
use ts_rs::TS;

/// Result of a single access check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/access-check-response.ts"
)]
pub struct AccessCheckResponse {
    pub subject: String,
    pub code: String,
    pub min_role: String,
    pub at: String,
    pub allowed: bool,
}

/// Highest role a subject holds on one code.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/effective-role-response.ts"
)]
pub struct EffectiveRoleResponse {
    pub subject: String,
    pub code: String,
    pub at: String,
    pub role: Option<String>,
}

/// Every code a subject may access at a minimum role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/allowed-codes-response.ts"
)]
pub struct AllowedCodesResponse {
    pub subject: String,
    pub min_role: String,
    pub at: String,
    pub codes: Vec<String>,
}
