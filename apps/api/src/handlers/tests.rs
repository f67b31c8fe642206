use chrono::{TimeZone, Utc};
use classgate_core::{AppError, UserIdentity};
use classgate_domain::AccessRole;

use super::{instant_or_now, parse_instant, role_or_viewer, target_subject};

fn user(subject: &str, is_administrator: bool) -> UserIdentity {
    UserIdentity::new(subject, subject, None, is_administrator)
}

#[test]
fn target_subject_defaults_to_caller() {
    let result = target_subject(&user("u1", false), None);
    assert!(result.is_ok_and(|subject| subject == "u1"));

    let blank = target_subject(&user("u1", false), Some("  ".to_owned()));
    assert!(blank.is_ok_and(|subject| subject == "u1"));
}

#[test]
fn only_administrators_inspect_other_subjects() {
    assert!(matches!(
        target_subject(&user("u1", false), Some("u2".to_owned())),
        Err(AppError::Forbidden(_))
    ));
    assert!(
        target_subject(&user("u1", false), Some("u1".to_owned()))
            .is_ok_and(|subject| subject == "u1")
    );
    assert!(
        target_subject(&user("root", true), Some("u2".to_owned()))
            .is_ok_and(|subject| subject == "u2")
    );
}

#[test]
fn instants_parse_with_offsets() {
    let expected = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).single();
    let parsed = parse_instant("2026-03-01T09:00:00+01:00");
    assert!(parsed.is_ok_and(|instant| Some(instant) == expected));

    assert!(matches!(
        parse_instant("yesterday"),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn missing_instant_means_now() {
    let before = Utc::now();
    let result = instant_or_now(None);
    assert!(result.is_ok_and(|instant| instant >= before));

    assert!(instant_or_now(Some("")).is_ok());
}

#[test]
fn role_defaults_to_viewer() {
    assert!(role_or_viewer(None).is_ok_and(|role| role == AccessRole::Viewer));
    assert!(role_or_viewer(Some("editor")).is_ok_and(|role| role == AccessRole::Editor));
    assert!(matches!(
        role_or_viewer(Some("owner")),
        Err(AppError::Validation(_))
    ));
}
