pub mod access;
pub mod classification;
pub mod grants;
pub mod health;
pub mod permission_requests;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use classgate_core::{AppError, UserIdentity};
use classgate_domain::AccessRole;

/// Parses an optional RFC 3339 instant, defaulting to the current time.
fn instant_or_now(value: Option<&str>) -> Result<DateTime<Utc>, AppError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => parse_instant(value),
        None => Ok(Utc::now()),
    }
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|error| AppError::Validation(format!("invalid timestamp '{value}': {error}")))
}

fn role_or_viewer(value: Option<&str>) -> Result<AccessRole, AppError> {
    value
        .map(AccessRole::from_transport)
        .transpose()
        .map(|role| role.unwrap_or(AccessRole::Viewer))
}

/// Resolves whose access is evaluated; only administrators may look at others.
fn target_subject(user: &UserIdentity, requested: Option<String>) -> Result<String, AppError> {
    match requested.filter(|subject| !subject.trim().is_empty()) {
        Some(subject) if subject != user.subject() && !user.is_administrator() => {
            Err(AppError::Forbidden(format!(
                "subject '{}' may not inspect access of '{subject}'",
                user.subject()
            )))
        }
        Some(subject) => Ok(subject),
        None => Ok(user.subject().to_owned()),
    }
}
