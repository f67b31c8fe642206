use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use classgate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AccessRole, ClassificationCode};

/// Unique identifier for a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRequestId(Uuid);

impl PermissionRequestId {
    /// Creates a new random request identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a request identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a request identifier from its transport form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid request_id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PermissionRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PermissionRequestId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Review state of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionRequestStatus {
    /// Waiting for an administrator decision.
    Pending,
    /// Approved; a grant was issued.
    Approved,
    /// Rejected by an administrator.
    Rejected,
}

impl PermissionRequestStatus {
    /// Returns a stable storage value for the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for PermissionRequestStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown permission request status '{value}'"
            ))),
        }
    }
}

/// A user's request for access to a classification code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequest {
    request_id: PermissionRequestId,
    subject: NonEmptyString,
    code: ClassificationCode,
    role: AccessRole,
    include_children: bool,
    reason: Option<String>,
    status: PermissionRequestStatus,
    decided_by: Option<String>,
    decision_note: Option<String>,
    requested_at: DateTime<Utc>,
}

impl PermissionRequest {
    /// Creates a pending request.
    pub fn new(
        request_id: PermissionRequestId,
        subject: impl Into<String>,
        code: ClassificationCode,
        role: AccessRole,
        include_children: bool,
        reason: Option<String>,
        requested_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            request_id,
            subject: NonEmptyString::new(subject)?,
            code,
            role,
            include_children,
            reason: reason.filter(|value| !value.trim().is_empty()),
            status: PermissionRequestStatus::Pending,
            decided_by: None,
            decision_note: None,
            requested_at,
        })
    }

    /// Returns the request with a stored decision, without transition checks.
    #[must_use]
    pub fn with_decision(
        mut self,
        status: PermissionRequestStatus,
        decided_by: Option<String>,
        decision_note: Option<String>,
    ) -> Self {
        self.status = status;
        self.decided_by = decided_by;
        self.decision_note = decision_note;
        self
    }

    /// Records an administrator decision on a pending request.
    pub fn decide(
        &mut self,
        status: PermissionRequestStatus,
        decided_by: &str,
        decision_note: Option<String>,
    ) -> AppResult<()> {
        if status == PermissionRequestStatus::Pending {
            return Err(AppError::Validation(
                "a decision must approve or reject the request".to_owned(),
            ));
        }

        if self.status != PermissionRequestStatus::Pending {
            return Err(AppError::Conflict(format!(
                "permission request '{}' was already {}",
                self.request_id,
                self.status.as_str().to_ascii_lowercase()
            )));
        }

        self.status = status;
        self.decided_by = Some(decided_by.to_owned());
        self.decision_note = decision_note.filter(|value| !value.trim().is_empty());
        Ok(())
    }

    /// Returns the request identifier.
    #[must_use]
    pub fn request_id(&self) -> PermissionRequestId {
        self.request_id
    }

    /// Returns the requesting subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the requested code.
    #[must_use]
    pub fn code(&self) -> &ClassificationCode {
        &self.code
    }

    /// Returns the requested role.
    #[must_use]
    pub fn role(&self) -> AccessRole {
        self.role
    }

    /// Returns whether descendant codes were requested too.
    #[must_use]
    pub fn include_children(&self) -> bool {
        self.include_children
    }

    /// Returns the requester's justification.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the review state.
    #[must_use]
    pub fn status(&self) -> PermissionRequestStatus {
        self.status
    }

    /// Returns the deciding administrator.
    #[must_use]
    pub fn decided_by(&self) -> Option<&str> {
        self.decided_by.as_deref()
    }

    /// Returns the note left with the decision.
    #[must_use]
    pub fn decision_note(&self) -> Option<&str> {
        self.decision_note.as_deref()
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use classgate_core::AppError;

    use super::{PermissionRequest, PermissionRequestId, PermissionRequestStatus};
    use crate::{AccessRole, ClassificationCode};

    fn pending() -> PermissionRequest {
        let code = match ClassificationCode::new("G06N") {
            Ok(code) => code,
            Err(error) => panic!("invalid test code: {error}"),
        };
        match PermissionRequest::new(
            PermissionRequestId::new(),
            "u1",
            code,
            AccessRole::Viewer,
            false,
            Some("  ".to_owned()),
            Utc::now(),
        ) {
            Ok(request) => request,
            Err(error) => panic!("invalid test request: {error}"),
        }
    }

    #[test]
    fn new_request_is_pending_without_blank_reason() {
        let request = pending();
        assert_eq!(request.status(), PermissionRequestStatus::Pending);
        assert!(request.reason().is_none());
    }

    #[test]
    fn decided_request_cannot_be_decided_again() {
        let mut request = pending();
        assert!(
            request
                .decide(PermissionRequestStatus::Approved, "admin", None)
                .is_ok()
        );
        assert_eq!(request.decided_by(), Some("admin"));

        let second = request.decide(PermissionRequestStatus::Rejected, "admin", None);
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[test]
    fn decision_must_leave_pending_state() {
        let mut request = pending();
        let result = request.decide(PermissionRequestStatus::Pending, "admin", None);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn status_parsing_ignores_case() {
        assert_eq!(
            "rejected".parse::<PermissionRequestStatus>().ok(),
            Some(PermissionRequestStatus::Rejected)
        );
    }
}
