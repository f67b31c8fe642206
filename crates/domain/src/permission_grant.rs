use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use classgate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AccessRole, ClassificationCode};

/// Unique identifier for a permission grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantId(Uuid);

impl GrantId {
    /// Creates a new random grant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a grant identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a grant identifier from its transport form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid grant_id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for GrantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GrantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Time span during which a grant may be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    valid_from: DateTime<Utc>,
    valid_until: Option<DateTime<Utc>>,
}

impl ValidityWindow {
    /// Creates a window; `valid_until = None` leaves it open-ended.
    pub fn new(valid_from: DateTime<Utc>, valid_until: Option<DateTime<Utc>>) -> AppResult<Self> {
        if valid_until.is_some_and(|until| until < valid_from) {
            return Err(AppError::Validation(
                "valid_until must not be earlier than valid_from".to_owned(),
            ));
        }

        Ok(Self {
            valid_from,
            valid_until,
        })
    }

    /// Creates an open-ended window starting at `valid_from`.
    #[must_use]
    pub fn starting_at(valid_from: DateTime<Utc>) -> Self {
        Self {
            valid_from,
            valid_until: None,
        }
    }

    /// Returns the inclusive start of the window.
    #[must_use]
    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    /// Returns the inclusive end of the window, when bounded.
    #[must_use]
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.valid_until
    }

    /// Returns whether `now` falls inside the window. Both bounds are inclusive.
    #[must_use]
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && self.valid_until.is_none_or(|until| now <= until)
    }

    /// Returns whether the window closed before `now`.
    #[must_use]
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| now > until)
    }
}

/// Access of one subject to one classification code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    grant_id: GrantId,
    subject: NonEmptyString,
    code: ClassificationCode,
    role: AccessRole,
    include_children: bool,
    validity: ValidityWindow,
    is_active: bool,
    granted_by: Option<String>,
}

impl PermissionGrant {
    /// Creates an active grant.
    pub fn new(
        grant_id: GrantId,
        subject: impl Into<String>,
        code: ClassificationCode,
        role: AccessRole,
        include_children: bool,
        validity: ValidityWindow,
    ) -> AppResult<Self> {
        Ok(Self {
            grant_id,
            subject: NonEmptyString::new(subject)?,
            code,
            role,
            include_children,
            validity,
            is_active: true,
            granted_by: None,
        })
    }

    /// Returns the grant with the given activity flag.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Returns the grant with the subject that issued it.
    #[must_use]
    pub fn with_granted_by(mut self, granted_by: Option<String>) -> Self {
        self.granted_by = granted_by;
        self
    }

    /// Returns the grant with a replaced validity window.
    #[must_use]
    pub fn with_validity(mut self, validity: ValidityWindow) -> Self {
        self.validity = validity;
        self
    }

    /// Returns the grant identifier.
    #[must_use]
    pub fn grant_id(&self) -> GrantId {
        self.grant_id
    }

    /// Returns the grantee subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the granted code.
    #[must_use]
    pub fn code(&self) -> &ClassificationCode {
        &self.code
    }

    /// Returns the granted role.
    #[must_use]
    pub fn role(&self) -> AccessRole {
        self.role
    }

    /// Returns whether the grant extends to descendant codes.
    #[must_use]
    pub fn include_children(&self) -> bool {
        self.include_children
    }

    /// Returns the validity window.
    #[must_use]
    pub fn validity(&self) -> &ValidityWindow {
        &self.validity
    }

    /// Returns whether the grant has not been deactivated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the subject that issued the grant, when recorded.
    #[must_use]
    pub fn granted_by(&self) -> Option<&str> {
        self.granted_by.as_deref()
    }

    /// Returns whether the grant is active and inside its window at `now`.
    #[must_use]
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.validity.contains(now)
    }

    /// Returns whether the granted role meets `minimum`.
    #[must_use]
    pub fn qualifies_for(&self, minimum: AccessRole) -> bool {
        self.role.satisfies(minimum)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{GrantId, PermissionGrant, ValidityWindow};
    use crate::{AccessRole, ClassificationCode};

    fn code(value: &str) -> ClassificationCode {
        match ClassificationCode::new(value) {
            Ok(code) => code,
            Err(error) => panic!("invalid test code '{value}': {error}"),
        }
    }

    fn grant(validity: ValidityWindow) -> PermissionGrant {
        match PermissionGrant::new(
            GrantId::new(),
            "u1",
            code("H01M"),
            AccessRole::Editor,
            true,
            validity,
        ) {
            Ok(grant) => grant,
            Err(error) => panic!("invalid test grant: {error}"),
        }
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        let now = Utc::now();
        let result = ValidityWindow::new(now, Some(now - Duration::seconds(1)));
        assert!(result.is_err());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let from = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single();
        let until = Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).single();
        let (Some(from), Some(until)) = (from, until) else {
            panic!("fixed timestamps must be valid");
        };
        let window = ValidityWindow::new(from, Some(until));
        assert!(window.is_ok_and(|window| {
            window.contains(from)
                && window.contains(until)
                && !window.contains(until + Duration::seconds(1))
                && !window.contains(from - Duration::seconds(1))
                && window.has_expired(until + Duration::seconds(1))
        }));
    }

    #[test]
    fn inactive_grant_is_never_effective() {
        let now = Utc::now();
        let grant = grant(ValidityWindow::starting_at(now - Duration::days(1))).with_active(false);
        assert!(!grant.is_effective_at(now));
    }

    #[test]
    fn future_grant_is_not_yet_effective() {
        let now = Utc::now();
        let grant = grant(ValidityWindow::starting_at(now + Duration::days(1)));
        assert!(!grant.is_effective_at(now));
        assert!(grant.is_effective_at(now + Duration::days(2)));
    }

    #[test]
    fn blank_subject_is_rejected() {
        let result = PermissionGrant::new(
            GrantId::new(),
            " ",
            code("H01M"),
            AccessRole::Viewer,
            false,
            ValidityWindow::starting_at(Utc::now()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn grant_id_parse_rejects_garbage() {
        assert!(GrantId::parse("not-a-uuid").is_err());
        let id = GrantId::new();
        assert_eq!(GrantId::parse(id.to_string().as_str()).ok(), Some(id));
    }
}
