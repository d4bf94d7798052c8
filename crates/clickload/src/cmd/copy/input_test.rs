//! Tests for JSON-lines input

use super::{JsonRows, parse_row};
use clickload_types::Value;
use std::sync::Arc;

fn columns() -> Vec<String> {
    vec!["id".into(), "name".into(), "score".into()]
}

// =============================================================================
// parse_row
// =============================================================================

#[test]
fn test_array_row() {
    let row = parse_row(r#"[1, "a", null]"#, &columns()).unwrap();
    assert_eq!(
        row,
        vec![Value::Int(1), Value::String("a".into()), Value::Null]
    );
}

#[test]
fn test_object_row_follows_column_order() {
    let row = parse_row(r#"{"score": 1.5, "id": 7}"#, &columns()).unwrap();
    assert_eq!(row, vec![Value::Int(7), Value::Default, Value::Float(1.5)]);
}

#[test]
fn test_default_marker() {
    let row = parse_row(r#"[1, {"$default": true}, 2]"#, &columns()).unwrap();
    assert!(row[1].is_default());
}

#[test]
fn test_unknown_object_key() {
    let err = parse_row(r#"{"id": 1, "nope": 2}"#, &columns()).unwrap_err();
    assert!(err.to_string().contains("unknown column 'nope'"));
}

#[test]
fn test_scalar_line_rejected() {
    let err = parse_row("42", &columns()).unwrap_err();
    assert!(err.to_string().contains("expected a JSON array or object"));
}

#[test]
fn test_invalid_json() {
    let err = parse_row("[1, 2", &columns()).unwrap_err();
    assert_eq!(err.to_string(), "invalid JSON");
}

// =============================================================================
// JsonRows
// =============================================================================

#[tokio::test]
async fn test_reader_skips_blank_lines() {
    let input: &[u8] = b"[1, \"a\", 2]\n\n   \n[2, \"b\", 3]\n";
    let mut rows = JsonRows::new(input, Arc::from(columns()));

    assert_eq!(rows.next_row().await.unwrap().unwrap()[0], Value::Int(1));
    assert_eq!(rows.next_row().await.unwrap().unwrap()[0], Value::Int(2));
    assert!(rows.next_row().await.unwrap().is_none());
    assert_eq!(rows.line_number(), 4);
}

#[tokio::test]
async fn test_reader_reports_line_number() {
    let input: &[u8] = b"[1, \"a\", 2]\n{oops\n";
    let mut rows = JsonRows::new(input, Arc::from(columns()));

    rows.next_row().await.unwrap();
    let err = rows.next_row().await.unwrap_err();
    assert_eq!(err.to_string(), "line 2");
    assert!(format!("{err:#}").contains("invalid JSON"));
}
