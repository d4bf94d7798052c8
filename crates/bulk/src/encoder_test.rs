//! Tests for the row encoder

use crate::batch::{BatchAccumulator, ColumnTypes};
use crate::encoder::{RowBinaryFormat, RowEncoder};
use crate::pool::RowPool;
use bytes::BytesMut;
use clickload_types::{ClickHouseTypeResolver, CodecError, TypeResolver, Value};
use std::sync::Arc;

fn types(declarations: &[&str]) -> ColumnTypes {
    let resolver = ClickHouseTypeResolver::new();
    declarations
        .iter()
        .map(|d| resolver.resolve_declaration(d).unwrap())
        .collect::<Vec<_>>()
        .into()
}

fn s(text: &str) -> Value {
    Value::String(text.into())
}

#[test]
fn test_format_names() {
    assert_eq!(RowBinaryFormat::RowBinary.to_string(), "RowBinary");
    assert_eq!(
        RowBinaryFormat::RowBinaryWithDefaults.as_str(),
        "RowBinaryWithDefaults"
    );
}

#[test]
fn test_dense_rows() {
    let types = types(&["UInt8", "String"]);
    let rows = vec![vec![Value::UInt(1), s("a")], vec![Value::UInt(2), s("")]];

    let mut out = BytesMut::new();
    RowEncoder::default()
        .encode_rows(&rows, &types, &mut out)
        .unwrap();

    assert_eq!(&out[..], &[1, 1, b'a', 2, 0]);
}

#[test]
fn test_sparse_default_flags() {
    let types = types(&["Int32", "Int32", "Int32"]);
    let rows = vec![vec![Value::Int(1), Value::Default, Value::Int(3)]];

    let mut out = BytesMut::new();
    RowEncoder::new(RowBinaryFormat::RowBinaryWithDefaults)
        .encode_rows(&rows, &types, &mut out)
        .unwrap();

    assert_eq!(&out[..], &[0, 1, 0, 0, 0, 1, 0, 3, 0, 0, 0]);

    let flags = [out[0], out[5], out[6]];
    assert_eq!(flags, [0, 1, 0]);
}

#[test]
fn test_default_in_dense_format_fails() {
    let types = types(&["Int32"]);
    let rows = vec![vec![Value::Default]];

    let err = RowEncoder::default()
        .encode_rows(&rows, &types, &mut BytesMut::new())
        .unwrap_err();

    assert_eq!(err.column, 0);
    assert!(matches!(err.source, CodecError::TypeMismatch { .. }));
}

#[test]
fn test_failure_restores_buffer_and_reports_row() {
    let types = types(&["UInt8", "String"]);
    let rows = vec![
        vec![Value::UInt(1), s("ok")],
        vec![Value::UInt(2), s("ok")],
        vec![Value::UInt(300), s("bad")],
    ];

    let mut out = BytesMut::from(&b"prefix"[..]);
    let err = RowEncoder::default()
        .encode_rows(&rows, &types, &mut out)
        .unwrap_err();

    assert_eq!(&out[..], b"prefix");
    assert_eq!(err.row_index, 2);
    assert_eq!(err.column, 0);
    assert_eq!(err.row, vec![Value::UInt(300), s("bad")]);
    assert!(matches!(err.source, CodecError::OutOfRange { .. }));
    assert!(err.to_string().starts_with("failed to serialize row 2 [300, 'bad'] at column 0"));
}

#[test]
fn test_row_width_mismatch() {
    let types = types(&["UInt8", "UInt8"]);
    let rows = vec![vec![Value::UInt(1)]];

    let err = RowEncoder::default()
        .encode_rows(&rows, &types, &mut BytesMut::new())
        .unwrap_err();

    assert_eq!(err.column, 1);
    assert_eq!(
        err.source,
        CodecError::RowWidth {
            expected: 2,
            found: 1
        }
    );
}

#[test]
fn test_encode_batch() {
    let pool = Arc::new(RowPool::new(1, 2));
    let mut acc = BatchAccumulator::new(2, pool, "q", types(&["Nullable(UInt8)"]));

    acc.add(vec![Value::Null]);
    let batch = acc.add(vec![Value::UInt(7)]).unwrap();

    let mut out = BytesMut::new();
    RowEncoder::default().encode(&batch, &mut out).unwrap();
    assert_eq!(&out[..], &[1, 0, 7]);
}
