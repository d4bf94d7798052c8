//! Tests for RowBinary column codecs

use crate::codec::{ClickHouseTypeResolver, CodecError, TypeResolver, put_varint};
use crate::value::Value;
use bytes::BytesMut;
use chrono::NaiveDate;
use std::net::Ipv4Addr;

fn encode(declaration: &str, value: Value) -> Result<Vec<u8>, CodecError> {
    let codec = ClickHouseTypeResolver::new()
        .resolve_declaration(declaration)
        .unwrap();
    let mut out = BytesMut::new();
    codec.write(&mut out, &value)?;
    Ok(out.to_vec())
}

fn s(text: &str) -> Value {
    Value::String(text.into())
}

// =============================================================================
// Primitives
// =============================================================================

#[test]
fn test_varint() {
    let mut out = BytesMut::new();
    put_varint(&mut out, 0);
    put_varint(&mut out, 127);
    put_varint(&mut out, 128);
    put_varint(&mut out, 300);
    assert_eq!(&out[..], &[0x00, 0x7f, 0x80, 0x01, 0xac, 0x02]);
}

#[test]
fn test_integers_little_endian() {
    assert_eq!(encode("Int32", Value::Int(-1)).unwrap(), vec![0xff; 4]);
    assert_eq!(encode("UInt16", Value::UInt(300)).unwrap(), vec![0x2c, 0x01]);
    assert_eq!(encode("Int8", s("-3")).unwrap(), vec![0xfd]);
    assert_eq!(
        encode("UInt64", Value::Float(2.0)).unwrap(),
        vec![2, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn test_wide_integers_sign_extend() {
    let mut expected = vec![0xfe];
    expected.extend([0xff; 31]);
    assert_eq!(encode("Int256", Value::Int(-2)).unwrap(), expected);

    let mut expected = vec![0x05];
    expected.extend([0x00; 31]);
    assert_eq!(encode("UInt256", Value::UInt(5)).unwrap(), expected);
}

#[test]
fn test_integer_range_checks() {
    assert!(matches!(
        encode("UInt8", Value::Int(256)),
        Err(CodecError::OutOfRange { .. })
    ));
    assert!(matches!(
        encode("UInt32", Value::Int(-1)),
        Err(CodecError::OutOfRange { .. })
    ));
    assert!(matches!(
        encode("Int32", s("x")),
        Err(CodecError::Invalid { .. })
    ));
    assert!(matches!(
        encode("Int32", Value::Float(1.5)),
        Err(CodecError::TypeMismatch { .. })
    ));
}

#[test]
fn test_null_into_non_nullable_is_mismatch() {
    let err = encode("Int32", Value::Null).unwrap_err();
    assert_eq!(
        err,
        CodecError::TypeMismatch {
            type_name: "Int32".into(),
            kind: "null",
            value: "NULL".into(),
        }
    );
}

#[test]
fn test_floats_and_bool() {
    assert_eq!(
        encode("Float32", Value::Float(1.0)).unwrap(),
        1.0f32.to_le_bytes().to_vec()
    );
    assert_eq!(
        encode("Float64", Value::Int(2)).unwrap(),
        2.0f64.to_le_bytes().to_vec()
    );
    assert_eq!(encode("Bool", Value::Bool(true)).unwrap(), vec![1]);
    assert_eq!(encode("Bool", Value::Int(0)).unwrap(), vec![0]);
    assert!(encode("Bool", Value::Int(2)).is_err());
}

// =============================================================================
// Strings and identifiers
// =============================================================================

#[test]
fn test_string() {
    assert_eq!(encode("String", s("abc")).unwrap(), b"\x03abc".to_vec());
    assert_eq!(
        encode("String", Value::Bytes(vec![0, 1])).unwrap(),
        vec![2, 0, 1]
    );
    assert_eq!(encode("String", Value::Int(42)).unwrap(), b"\x0242".to_vec());
    assert!(encode("String", Value::Null).is_err());
}

#[test]
fn test_fixed_string_pads() {
    assert_eq!(
        encode("FixedString(4)", s("ab")).unwrap(),
        vec![b'a', b'b', 0, 0]
    );
    assert!(matches!(
        encode("FixedString(4)", s("abcde")),
        Err(CodecError::Invalid { .. })
    ));
}

#[test]
fn test_uuid_halves() {
    let bytes = encode("UUID", s("00112233-4455-6677-8899-aabbccddeeff")).unwrap();
    assert_eq!(
        bytes,
        vec![
            0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, 0x00, 0xff, 0xee, 0xdd, 0xcc, 0xbb, 0xaa,
            0x99, 0x88,
        ]
    );
}

#[test]
fn test_ip_addresses() {
    assert_eq!(encode("IPv4", s("1.2.3.4")).unwrap(), vec![4, 3, 2, 1]);
    assert_eq!(
        encode("IPv4", Value::from(Ipv4Addr::new(10, 0, 0, 1))).unwrap(),
        vec![1, 0, 0, 10]
    );

    let mut loopback = vec![0u8; 15];
    loopback.push(1);
    assert_eq!(encode("IPv6", s("::1")).unwrap(), loopback);

    let mapped = encode("IPv6", s("1.2.3.4")).unwrap();
    assert_eq!(&mapped[10..], &[0xff, 0xff, 1, 2, 3, 4]);
}

// =============================================================================
// Dates and decimals
// =============================================================================

#[test]
fn test_dates() {
    let date = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
    assert_eq!(encode("Date", Value::Date(date)).unwrap(), vec![1, 0]);
    assert_eq!(encode("Date", s("2000-01-01")).unwrap(), vec![0xcd, 0x2a]);
    assert_eq!(
        encode("Date32", s("1969-12-31")).unwrap(),
        (-1i32).to_le_bytes().to_vec()
    );
    assert!(matches!(
        encode("Date", s("1969-12-31")),
        Err(CodecError::OutOfRange { .. })
    ));
}

#[test]
fn test_datetime_seconds() {
    assert_eq!(
        encode("DateTime", s("2001-09-09 01:46:40")).unwrap(),
        vec![0x00, 0xca, 0x9a, 0x3b]
    );
    assert_eq!(
        encode("DateTime('UTC')", s("2001-09-09T01:46:40Z")).unwrap(),
        vec![0x00, 0xca, 0x9a, 0x3b]
    );
    assert_eq!(
        encode("DateTime", Value::UInt(1)).unwrap(),
        vec![1, 0, 0, 0]
    );
}

#[test]
fn test_datetime64_ticks() {
    assert_eq!(
        encode("DateTime64(3)", s("1970-01-01 00:00:01.5")).unwrap(),
        1500i64.to_le_bytes().to_vec()
    );
    assert_eq!(
        encode("DateTime64(6, 'UTC')", Value::Int(7)).unwrap(),
        7i64.to_le_bytes().to_vec()
    );
}

#[test]
fn test_decimal_scaling() {
    assert_eq!(
        encode("Decimal(9, 2)", s("12.34")).unwrap(),
        1234i32.to_le_bytes().to_vec()
    );
    assert_eq!(
        encode("Decimal(9, 2)", s("-1.230")).unwrap(),
        (-123i32).to_le_bytes().to_vec()
    );
    assert_eq!(
        encode("Decimal(9, 2)", Value::Int(5)).unwrap(),
        500i32.to_le_bytes().to_vec()
    );
    assert_eq!(
        encode("Decimal64(3)", Value::Float(0.5)).unwrap(),
        500i64.to_le_bytes().to_vec()
    );
    assert_eq!(
        encode("Decimal128(0)", Value::Int(1)).unwrap(),
        1i128.to_le_bytes().to_vec()
    );
    assert_eq!(encode("Decimal(76, 0)", Value::Int(-1)).unwrap(), vec![0xff; 32]);
}

#[test]
fn test_decimal_rejects_overflow_and_extra_digits() {
    assert!(matches!(
        encode("Decimal(5, 2)", Value::Int(1000)),
        Err(CodecError::OutOfRange { .. })
    ));
    assert!(matches!(
        encode("Decimal(9, 2)", s("1.234")),
        Err(CodecError::Invalid { .. })
    ));
    assert!(matches!(
        encode("Decimal(9, 2)", s("1.2.3")),
        Err(CodecError::Invalid { .. })
    ));
}

#[test]
fn test_enum_by_name_or_value() {
    let decl = "Enum8('a' = 1, 'b' = 2)";
    assert_eq!(encode(decl, s("b")).unwrap(), vec![2]);
    assert_eq!(encode(decl, Value::Int(1)).unwrap(), vec![1]);
    assert!(matches!(encode(decl, Value::Int(3)), Err(CodecError::Invalid { .. })));
    assert!(matches!(encode(decl, s("c")), Err(CodecError::Invalid { .. })));

    assert_eq!(
        encode("Enum16('x' = 1000)", s("x")).unwrap(),
        1000i16.to_le_bytes().to_vec()
    );
}

// =============================================================================
// Composites
// =============================================================================

#[test]
fn test_nullable_flag() {
    assert_eq!(encode("Nullable(Int8)", Value::Null).unwrap(), vec![1]);
    assert_eq!(encode("Nullable(Int8)", Value::Int(5)).unwrap(), vec![0, 5]);
}

#[test]
fn test_array_and_map() {
    assert_eq!(
        encode("Array(UInt8)", Value::from(vec![1u8, 2])).unwrap(),
        vec![2, 1, 2]
    );
    assert_eq!(
        encode(
            "Map(String, UInt8)",
            Value::Map(vec![(s("a"), Value::UInt(1))])
        )
        .unwrap(),
        vec![1, 1, b'a', 1]
    );
    assert!(encode("Array(UInt8)", Value::Int(1)).is_err());
}

#[test]
fn test_nested_tuples() {
    let value = Value::Tuple(vec![
        Value::Int(1),
        Value::Tuple(vec![Value::UInt(2), s("s"), Value::Null]),
    ]);
    assert_eq!(
        encode("Tuple(Int32, Tuple(UInt8, String, Nullable(Int32)))", value).unwrap(),
        vec![1, 0, 0, 0, 2, 1, b's', 1]
    );
}

#[test]
fn test_tuple_width_mismatch() {
    let err = encode("Tuple(Int32, String)", Value::Tuple(vec![Value::Int(1)])).unwrap_err();
    assert!(matches!(err, CodecError::Invalid { .. }));
}

#[test]
fn test_nested_is_array_of_tuples() {
    let value = Value::Array(vec![
        Value::Array(vec![Value::Int(1), s("x")]),
        Value::Tuple(vec![Value::Int(2), s("")]),
    ]);
    assert_eq!(
        encode("Nested(a Int32, b String)", value.clone()).unwrap(),
        vec![2, 1, 0, 0, 0, 1, b'x', 2, 0, 0, 0, 0]
    );

    // A wrapped Nested inside a tuple encodes the same way
    let wrapped = encode("Tuple(Nested(a Int32, b String))", Value::Tuple(vec![value])).unwrap();
    assert_eq!(wrapped, vec![2, 1, 0, 0, 0, 1, b'x', 2, 0, 0, 0, 0]);
}

#[test]
fn test_low_cardinality_is_transparent() {
    assert_eq!(
        encode("LowCardinality(Nullable(String))", s("a")).unwrap(),
        vec![0, 1, b'a']
    );
}

#[test]
fn test_default_marker_is_not_a_value() {
    assert!(matches!(
        encode("Int32", Value::Default),
        Err(CodecError::TypeMismatch { kind: "default", .. })
    ));
}
