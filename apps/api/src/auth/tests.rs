use super::token_matches;

#[test]
fn bootstrap_token_must_match_exactly() {
    let expected = "gateway-secret-0123456789";

    assert!(token_matches("gateway-secret-0123456789", expected));
    assert!(!token_matches("gateway-secret-0123456788", expected));
    assert!(!token_matches("gateway-secret", expected));
    assert!(!token_matches("", expected));
}
