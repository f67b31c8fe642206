use classgate_core::AppError;

use super::parse_tree_document;

#[test]
fn bare_arrays_and_wrapped_documents_are_accepted() {
    let bare = r#"[
        {"code": "H", "title": "Electricity"},
        {"code": "H01M", "parent_code": "H", "section": "H"}
    ]"#;
    let wrapped = r#"{"nodes": [{"code": "H01M10", "parent_code": "H01M"}]}"#;

    let Ok(bare) = parse_tree_document(bare) else {
        panic!("bare array should parse");
    };
    assert_eq!(bare.len(), 2);
    assert!(bare[0].is_root());
    assert_eq!(bare[1].section().as_str(), "H");

    let Ok(wrapped) = parse_tree_document(wrapped) else {
        panic!("wrapped document should parse");
    };
    assert_eq!(wrapped[0].section().as_str(), "H");
}

#[test]
fn blank_parent_means_root() {
    let result = parse_tree_document(r#"[{"code": "A", "parent_code": " "}]"#);
    assert!(result.is_ok_and(|nodes| nodes[0].is_root()));
}

#[test]
fn malformed_files_are_validation_errors() {
    assert!(matches!(
        parse_tree_document("{\"code\": 1}"),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        parse_tree_document(r#"[{"code": "  "}]"#),
        Err(AppError::Validation(_))
    ));
}
