//! Tests for structural validation.

use serde_json::json;

use crate::compose::{ComposeError, validate};

fn violation_path(document: &serde_json::Value) -> String {
    match validate(document) {
        Err(ComposeError::SchemaViolation { path, .. }) => path,
        other => panic!("Expected SchemaViolation, got {other:?}"),
    }
}

#[test]
fn empty_object_is_valid() {
    assert!(validate(&json!({})).is_ok());
}

#[test]
fn root_must_be_object() {
    assert_eq!(violation_path(&json!([])), "");
}

#[test]
fn sections_must_be_lists() {
    assert_eq!(violation_path(&json!({"interfaces": {}})), "/interfaces");
}

#[test]
fn section_items_must_be_objects() {
    assert_eq!(violation_path(&json!({"wireguard": ["wg0"]})), "/wireguard/0");
}

#[test]
fn files_need_path_and_contents() {
    assert_eq!(
        violation_path(&json!({"files": [{"path": "/a"}]})),
        "/files/0/contents"
    );
}

#[test]
fn file_mode_must_be_octal() {
    assert_eq!(
        violation_path(&json!({"files": [{"path": "/a", "contents": "", "mode": "0999"}]})),
        "/files/0/mode"
    );
    assert!(validate(&json!({"files": [{"path": "/a", "contents": "", "mode": "644"}]})).is_ok());
}

#[test]
fn unknown_sections_are_not_checked() {
    assert!(validate(&json!({"custom": "anything", "system": [1]})).is_ok());
}
