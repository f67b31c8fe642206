use axum::http::{HeaderMap, HeaderValue, Method};
use classgate_core::AppError;

use super::{check_same_origin, is_state_changing_method};

const FRONTEND: &str = "http://localhost:3000";

fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for &(name, value) in pairs {
        headers.insert(name, HeaderValue::from_static(value));
    }
    headers
}

#[test]
fn matching_origin_passes() {
    let headers = headers(&[("origin", FRONTEND)]);
    assert!(check_same_origin(&headers, FRONTEND).is_ok());
}

#[test]
fn matching_referer_passes_without_origin() {
    let headers = headers(&[("referer", "http://localhost:3000/grants")]);
    assert!(check_same_origin(&headers, FRONTEND).is_ok());
}

#[test]
fn foreign_or_missing_origin_is_rejected() {
    let foreign = headers(&[("origin", "https://evil.example")]);
    assert!(matches!(
        check_same_origin(&foreign, FRONTEND),
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        check_same_origin(&HeaderMap::new(), FRONTEND),
        Err(AppError::Unauthorized(_))
    ));
}

#[test]
fn cross_site_fetch_is_rejected_even_with_origin() {
    let headers = headers(&[
        ("origin", FRONTEND),
        ("sec-fetch-site", "cross-site"),
    ]);
    assert!(matches!(
        check_same_origin(&headers, FRONTEND),
        Err(AppError::Unauthorized(_))
    ));
}

#[test]
fn only_mutating_methods_are_checked() {
    assert!(is_state_changing_method(&Method::POST));
    assert!(is_state_changing_method(&Method::PUT));
    assert!(is_state_changing_method(&Method::DELETE));
    assert!(!is_state_changing_method(&Method::GET));
    assert!(!is_state_changing_method(&Method::OPTIONS));
}

#[test]
fn referer_must_sit_under_the_frontend_origin() {
    let lookalike = headers(&[("referer", "http://localhost:3000.evil.example/grants")]);
    assert!(matches!(
        check_same_origin(&lookalike, FRONTEND),
        Err(AppError::Unauthorized(_))
    ));

    let other_port = headers(&[("referer", "http://localhost:30001/")]);
    assert!(check_same_origin(&other_port, FRONTEND).is_err());

    let bare = headers(&[("referer", FRONTEND)]);
    assert!(check_same_origin(&bare, FRONTEND).is_ok());
}

#[test]
fn trailing_slash_in_frontend_url_is_ignored() {
    let origin = headers(&[("origin", FRONTEND)]);
    assert!(check_same_origin(&origin, "http://localhost:3000/").is_ok());
}
