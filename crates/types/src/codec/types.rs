//! ClickHouse column types and their RowBinary writers

use std::borrow::Cow;
use std::fmt;
use std::net::IpAddr;

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use super::write::{put_string, put_varint, put_wide};
use super::{CodecError, ColumnCodec};
use crate::value::Value;

const SECS_PER_DAY: i64 = 86_400;

/// Largest float that still converts into an `i128` without saturating
const I128_FLOAT_LIMIT: f64 = 1.7e38;

/// A resolved ClickHouse column type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickHouseType {
    Nothing,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
    Float32,
    Float64,
    String,
    FixedString(usize),
    Uuid,
    Date,
    Date32,
    /// Seconds since epoch; the timezone only affects server-side rendering
    DateTime(Option<String>),
    DateTime64 {
        precision: u32,
        timezone: Option<String>,
    },
    Decimal {
        precision: u32,
        scale: u32,
    },
    Enum8(Vec<(String, i8)>),
    Enum16(Vec<(String, i16)>),
    IPv4,
    IPv6,
    Nullable(Box<ClickHouseType>),
    Array(Box<ClickHouseType>),
    Tuple(Vec<ClickHouseType>),
    Map(Box<ClickHouseType>, Box<ClickHouseType>),
    LowCardinality(Box<ClickHouseType>),
    /// Encoded as `Array(Tuple(member types...))`
    Nested(Vec<(String, ClickHouseType)>),
}

impl ClickHouseType {
    /// Storage width in bytes of a decimal with the given precision
    pub fn decimal_width(precision: u32) -> usize {
        match precision {
            0..=9 => 4,
            10..=18 => 8,
            19..=38 => 16,
            _ => 32,
        }
    }

    // -------------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------------

    fn mismatch(&self, value: &Value) -> CodecError {
        CodecError::TypeMismatch {
            type_name: self.to_string(),
            kind: value.kind(),
            value: value.to_string(),
        }
    }

    fn out_of_range(&self, value: impl fmt::Display) -> CodecError {
        CodecError::OutOfRange {
            type_name: self.to_string(),
            value: value.to_string(),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> CodecError {
        CodecError::Invalid {
            type_name: self.to_string(),
            reason: reason.into(),
        }
    }

    // -------------------------------------------------------------------------
    // Coercions
    // -------------------------------------------------------------------------

    fn signed(&self, value: &Value) -> Result<i128, CodecError> {
        match value {
            Value::Bool(v) => Ok(i128::from(*v)),
            Value::Int(v) => Ok(i128::from(*v)),
            Value::UInt(v) => Ok(i128::from(*v)),
            Value::Int128(v) => Ok(*v),
            Value::UInt128(v) => i128::try_from(*v).map_err(|_| self.out_of_range(value)),
            Value::Float(v) if v.fract() == 0.0 && v.abs() < I128_FLOAT_LIMIT => Ok(*v as i128),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| self.invalid(format!("'{s}' is not an integer"))),
            _ => Err(self.mismatch(value)),
        }
    }

    fn unsigned(&self, value: &Value) -> Result<u128, CodecError> {
        match value {
            Value::UInt128(v) => Ok(*v),
            Value::String(s) if !s.trim_start().starts_with('-') => s
                .trim()
                .parse()
                .map_err(|_| self.invalid(format!("'{s}' is not an integer"))),
            _ => u128::try_from(self.signed(value)?).map_err(|_| self.out_of_range(value)),
        }
    }

    fn int<T: TryFrom<i128>>(&self, value: &Value) -> Result<T, CodecError> {
        T::try_from(self.signed(value)?).map_err(|_| self.out_of_range(value))
    }

    fn uint<T: TryFrom<u128>>(&self, value: &Value) -> Result<T, CodecError> {
        T::try_from(self.unsigned(value)?).map_err(|_| self.out_of_range(value))
    }

    fn float(&self, value: &Value) -> Result<f64, CodecError> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::UInt(v) => Ok(*v as f64),
            Value::Int128(v) => Ok(*v as f64),
            Value::UInt128(v) => Ok(*v as f64),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| self.invalid(format!("'{s}' is not a number"))),
            _ => Err(self.mismatch(value)),
        }
    }

    fn bytes<'v>(&self, value: &'v Value) -> Result<Cow<'v, [u8]>, CodecError> {
        match value {
            Value::String(s) => Ok(Cow::Borrowed(s.as_bytes())),
            Value::Bytes(b) => Ok(Cow::Borrowed(b)),
            Value::Bool(_)
            | Value::Int(_)
            | Value::UInt(_)
            | Value::Int128(_)
            | Value::UInt128(_)
            | Value::Float(_)
            | Value::Uuid(_)
            | Value::Ip(_)
            | Value::Date(_)
            | Value::DateTime(_) => Ok(Cow::Owned(value.to_string().into_bytes())),
            _ => Err(self.mismatch(value)),
        }
    }

    fn uuid(&self, value: &Value) -> Result<Uuid, CodecError> {
        match value {
            Value::Uuid(v) => Ok(*v),
            Value::String(s) => {
                Uuid::parse_str(s.trim()).map_err(|e| self.invalid(format!("'{s}': {e}")))
            }
            _ => Err(self.mismatch(value)),
        }
    }

    fn ip(&self, value: &Value) -> Result<IpAddr, CodecError> {
        match value {
            Value::Ip(v) => Ok(*v),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| self.invalid(format!("'{s}' is not an IP address"))),
            _ => Err(self.mismatch(value)),
        }
    }

    /// Days since 1970-01-01
    fn days(&self, value: &Value) -> Result<i64, CodecError> {
        match value {
            Value::Date(d) => Ok(midnight(*d).timestamp().div_euclid(SECS_PER_DAY)),
            Value::DateTime(dt) => Ok(dt.timestamp().div_euclid(SECS_PER_DAY)),
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(|d| midnight(d).timestamp().div_euclid(SECS_PER_DAY))
                .map_err(|_| self.invalid(format!("'{s}' is not a date"))),
            _ => self.int(value),
        }
    }

    fn instant(&self, value: &Value) -> Result<DateTime<Utc>, CodecError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::Date(d) => Ok(midnight(*d)),
            Value::String(s) => {
                parse_instant(s.trim()).ok_or_else(|| self.invalid(format!("'{s}' is not a datetime")))
            }
            _ => Err(self.mismatch(value)),
        }
    }

    fn ticks(&self, precision: u32, value: &Value) -> Result<i64, CodecError> {
        if matches!(value, Value::Int(_) | Value::UInt(_) | Value::Int128(_)) {
            return self.int(value);
        }

        let instant = self.instant(value)?;
        let factor = 10i64.pow(precision);
        let subsec = i64::from(instant.timestamp_subsec_nanos()) / 10i64.pow(9 - precision);
        instant
            .timestamp()
            .checked_mul(factor)
            .and_then(|t| t.checked_add(subsec))
            .ok_or_else(|| self.out_of_range(value))
    }

    fn decimal(&self, precision: u32, scale: u32, value: &Value) -> Result<i128, CodecError> {
        let scaled = match value {
            Value::Float(v) => {
                let scaled = (v * 10f64.powi(scale as i32)).round();
                if !scaled.is_finite() || scaled.abs() >= I128_FLOAT_LIMIT {
                    return Err(self.out_of_range(value));
                }
                scaled as i128
            }
            Value::String(s) => parse_decimal(s, scale).ok_or_else(|| {
                self.invalid(format!("'{s}' is not a decimal with scale {scale}"))
            })?,
            _ => {
                let whole = self.signed(value)?;
                10i128
                    .checked_pow(scale)
                    .and_then(|factor| whole.checked_mul(factor))
                    .ok_or_else(|| self.out_of_range(value))?
            }
        };

        if let Some(limit) = 10u128.checked_pow(precision)
            && scaled.unsigned_abs() >= limit
        {
            return Err(self.out_of_range(value));
        }
        Ok(scaled)
    }

    fn enum_value<T>(&self, members: &[(String, T)], value: &Value) -> Result<T, CodecError>
    where
        T: Copy + Into<i128>,
    {
        match value {
            Value::String(name) => members
                .iter()
                .find(|(member, _)| member == name)
                .map(|(_, v)| *v)
                .ok_or_else(|| self.invalid(format!("'{name}' is not an enum member"))),
            _ => {
                let number = self.signed(value)?;
                members
                    .iter()
                    .find(|(_, v)| Into::<i128>::into(*v) == number)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| self.invalid(format!("{number} is not an enum value")))
            }
        }
    }

    fn write_fields<'t>(
        &self,
        out: &mut BytesMut,
        types: impl ExactSizeIterator<Item = &'t ClickHouseType>,
        value: &Value,
    ) -> Result<(), CodecError> {
        let items = match value {
            Value::Tuple(items) | Value::Array(items) => items,
            _ => return Err(self.mismatch(value)),
        };
        if items.len() != types.len() {
            return Err(self.invalid(format!(
                "expected {} elements, got {}",
                types.len(),
                items.len()
            )));
        }
        for (ty, item) in types.zip(items) {
            ty.write(out, item)?;
        }
        Ok(())
    }
}

impl ColumnCodec for ClickHouseType {
    fn write(&self, out: &mut BytesMut, value: &Value) -> Result<(), CodecError> {
        match self {
            Self::Nothing => {
                if !value.is_null() {
                    return Err(self.mismatch(value));
                }
            }
            Self::Bool => {
                let flag = match value {
                    Value::Bool(v) => *v,
                    _ => match self.signed(value)? {
                        0 => false,
                        1 => true,
                        _ => return Err(self.out_of_range(value)),
                    },
                };
                out.put_u8(u8::from(flag));
            }

            Self::Int8 => out.put_i8(self.int(value)?),
            Self::Int16 => out.put_i16_le(self.int(value)?),
            Self::Int32 => out.put_i32_le(self.int(value)?),
            Self::Int64 => out.put_i64_le(self.int(value)?),
            Self::Int128 => out.put_i128_le(self.signed(value)?),
            Self::Int256 => {
                let v = self.signed(value)?;
                put_wide(out, v as u128, v < 0);
            }
            Self::UInt8 => out.put_u8(self.uint(value)?),
            Self::UInt16 => out.put_u16_le(self.uint(value)?),
            Self::UInt32 => out.put_u32_le(self.uint(value)?),
            Self::UInt64 => out.put_u64_le(self.uint(value)?),
            Self::UInt128 => out.put_u128_le(self.unsigned(value)?),
            Self::UInt256 => put_wide(out, self.unsigned(value)?, false),

            Self::Float32 => out.put_f32_le(self.float(value)? as f32),
            Self::Float64 => out.put_f64_le(self.float(value)?),

            Self::String => put_string(out, &self.bytes(value)?),
            Self::FixedString(width) => {
                let bytes = self.bytes(value)?;
                if bytes.len() > *width {
                    return Err(self.invalid(format!("{} bytes do not fit", bytes.len())));
                }
                out.put_slice(&bytes);
                out.put_bytes(0, width - bytes.len());
            }

            Self::Uuid => {
                let (high, low) = self.uuid(value)?.as_u64_pair();
                out.put_u64_le(high);
                out.put_u64_le(low);
            }

            Self::Date => {
                let days = self.days(value)?;
                out.put_u16_le(u16::try_from(days).map_err(|_| self.out_of_range(value))?);
            }
            Self::Date32 => {
                let days = self.days(value)?;
                out.put_i32_le(i32::try_from(days).map_err(|_| self.out_of_range(value))?);
            }
            Self::DateTime(_) => {
                let seconds = match value {
                    Value::Int(_) | Value::UInt(_) => self.uint(value)?,
                    _ => u32::try_from(self.instant(value)?.timestamp())
                        .map_err(|_| self.out_of_range(value))?,
                };
                out.put_u32_le(seconds);
            }
            Self::DateTime64 { precision, .. } => out.put_i64_le(self.ticks(*precision, value)?),

            Self::Decimal { precision, scale } => {
                let v = self.decimal(*precision, *scale, value)?;
                match Self::decimal_width(*precision) {
                    4 => out.put_i32_le(i32::try_from(v).map_err(|_| self.out_of_range(value))?),
                    8 => out.put_i64_le(i64::try_from(v).map_err(|_| self.out_of_range(value))?),
                    16 => out.put_i128_le(v),
                    _ => put_wide(out, v as u128, v < 0),
                }
            }

            Self::Enum8(members) => out.put_i8(self.enum_value(members, value)?),
            Self::Enum16(members) => out.put_i16_le(self.enum_value(members, value)?),

            Self::IPv4 => {
                let addr = match self.ip(value)? {
                    IpAddr::V4(v4) => v4,
                    IpAddr::V6(v6) => v6.to_ipv4_mapped().ok_or_else(|| self.out_of_range(value))?,
                };
                out.put_u32_le(u32::from(addr));
            }
            Self::IPv6 => {
                let addr = match self.ip(value)? {
                    IpAddr::V4(v4) => v4.to_ipv6_mapped(),
                    IpAddr::V6(v6) => v6,
                };
                out.put_slice(&addr.octets());
            }

            Self::Nullable(inner) => {
                if value.is_null() {
                    out.put_u8(1);
                } else {
                    out.put_u8(0);
                    inner.write(out, value)?;
                }
            }
            Self::Array(inner) => {
                let Value::Array(items) = value else {
                    return Err(self.mismatch(value));
                };
                put_varint(out, items.len() as u64);
                for item in items {
                    inner.write(out, item)?;
                }
            }
            Self::Tuple(elements) => self.write_fields(out, elements.iter(), value)?,
            Self::Map(key_type, value_type) => {
                let Value::Map(entries) = value else {
                    return Err(self.mismatch(value));
                };
                put_varint(out, entries.len() as u64);
                for (key, entry) in entries {
                    key_type.write(out, key)?;
                    value_type.write(out, entry)?;
                }
            }
            Self::LowCardinality(inner) => inner.write(out, value)?,
            Self::Nested(members) => {
                let Value::Array(rows) = value else {
                    return Err(self.mismatch(value));
                };
                put_varint(out, rows.len() as u64);
                for row in rows {
                    self.write_fields(out, members.iter().map(|(_, ty)| ty), row)?;
                }
            }
        }
        Ok(())
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// RFC 3339, then `YYYY-MM-DD hh:mm:ss[.f]` and `YYYY-MM-DD` as UTC
fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(midnight)
}

/// Exact decimal text to a scaled integer
///
/// Fractional digits beyond `scale` must be zero.
fn parse_decimal(text: &str, scale: u32) -> Option<i128> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let kept = fraction.len().min(scale as usize);
    if fraction.bytes().skip(kept).any(|b| b != b'0') {
        return None;
    }

    let mut acc: i128 = 0;
    for b in whole.bytes().chain(fraction.bytes().take(kept)) {
        acc = acc.checked_mul(10)?.checked_add(i128::from(b - b'0'))?;
    }
    for _ in kept..scale as usize {
        acc = acc.checked_mul(10)?;
    }
    Some(if negative { -acc } else { acc })
}

// =============================================================================
// Display
// =============================================================================

fn write_enum<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    members: &[(String, T)],
) -> fmt::Result {
    write!(f, "{kind}(")?;
    for (i, (name, value)) in members.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "'{}' = {value}", name.replace('\'', "\\'"))?;
    }
    f.write_str(")")
}

impl fmt::Display for ClickHouseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nothing => f.write_str("Nothing"),
            Self::Bool => f.write_str("Bool"),
            Self::Int8 => f.write_str("Int8"),
            Self::Int16 => f.write_str("Int16"),
            Self::Int32 => f.write_str("Int32"),
            Self::Int64 => f.write_str("Int64"),
            Self::Int128 => f.write_str("Int128"),
            Self::Int256 => f.write_str("Int256"),
            Self::UInt8 => f.write_str("UInt8"),
            Self::UInt16 => f.write_str("UInt16"),
            Self::UInt32 => f.write_str("UInt32"),
            Self::UInt64 => f.write_str("UInt64"),
            Self::UInt128 => f.write_str("UInt128"),
            Self::UInt256 => f.write_str("UInt256"),
            Self::Float32 => f.write_str("Float32"),
            Self::Float64 => f.write_str("Float64"),
            Self::String => f.write_str("String"),
            Self::FixedString(width) => write!(f, "FixedString({width})"),
            Self::Uuid => f.write_str("UUID"),
            Self::Date => f.write_str("Date"),
            Self::Date32 => f.write_str("Date32"),
            Self::DateTime(None) => f.write_str("DateTime"),
            Self::DateTime(Some(tz)) => write!(f, "DateTime('{tz}')"),
            Self::DateTime64 {
                precision,
                timezone: None,
            } => write!(f, "DateTime64({precision})"),
            Self::DateTime64 {
                precision,
                timezone: Some(tz),
            } => write!(f, "DateTime64({precision}, '{tz}')"),
            Self::Decimal { precision, scale } => write!(f, "Decimal({precision}, {scale})"),
            Self::Enum8(members) => write_enum(f, "Enum8", members),
            Self::Enum16(members) => write_enum(f, "Enum16", members),
            Self::IPv4 => f.write_str("IPv4"),
            Self::IPv6 => f.write_str("IPv6"),
            Self::Nullable(inner) => write!(f, "Nullable({inner})"),
            Self::Array(inner) => write!(f, "Array({inner})"),
            Self::Tuple(elements) => {
                f.write_str("Tuple(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str(")")
            }
            Self::Map(key, value) => write!(f, "Map({key}, {value})"),
            Self::LowCardinality(inner) => write!(f, "LowCardinality({inner})"),
            Self::Nested(members) => {
                f.write_str("Nested(")?;
                for (i, (name, ty)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name} {ty}")?;
                }
                f.write_str(")")
            }
        }
    }
}
