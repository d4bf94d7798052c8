//! Dynamic row values
//!
//! A [`Row`] is an ordered list of [`Value`]s, one per destination column.
//! Codecs decide which variants they accept; the variants only describe the
//! shape of the data, not the ClickHouse type it ends up as.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Object key that turns a JSON object into [`Value::Default`]
///
/// `{"$default": true}` asks the server to fill the column default when the
/// copy uses `RowBinaryWithDefaults`.
pub const DEFAULT_MARKER_KEY: &str = "$default";

/// One row, in column order
pub type Row = Vec<Value>;

/// A single column value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    /// Use the column default (sparse encoding only)
    Default,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Int128(i128),
    UInt128(u128),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Ip(IpAddr),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Short variant name for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Default => "default",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::Int128(_) => "signed integer",
            Self::UInt(_) | Self::UInt128(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Uuid(_) => "uuid",
            Self::Ip(_) => "ip address",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Default => f.write_str("DEFAULT"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Int128(v) => write!(f, "{v}"),
            Self::UInt128(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "'{}'", v.escape_default()),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::Ip(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                write_list(f, items)?;
                f.write_str(")")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Display adapter for a whole row (`[1, 'a', NULL]`)
pub struct RowDisplay<'a>(pub &'a [Value]);

impl fmt::Display for RowDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        write_list(f, self.0)?;
        f.write_str("]")
    }
}

// =============================================================================
// Conversions
// =============================================================================

macro_rules! impl_from {
    ($variant:ident <- $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::$variant(v.into())
                }
            }
        )+
    };
}

impl_from!(Bool <- bool);
impl_from!(Int <- i8, i16, i32, i64);
impl_from!(UInt <- u8, u16, u32, u64);
impl_from!(Int128 <- i128);
impl_from!(UInt128 <- u128);
impl_from!(Float <- f32, f64);
impl_from!(String <- String, &str);
impl_from!(Uuid <- Uuid);
impl_from!(Ip <- IpAddr, Ipv4Addr, Ipv6Addr);
impl_from!(Date <- NaiveDate);
impl_from!(DateTime <- DateTime<Utc>);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

/// JSON to value mapping used for JSON-lines input
///
/// Numbers map to `Int`, `UInt` or `Float` in that order of preference,
/// arrays to `Array` and objects to `Map` with string keys. Codecs coerce
/// strings into dates, UUIDs, addresses and decimals as needed.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(v) => Self::Bool(v),
            Json::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Self::Int(v)
                } else if let Some(v) = n.as_u64() {
                    Self::UInt(v)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => {
                if map.len() == 1
                    && let Some(Json::Bool(true)) = map.get(DEFAULT_MARKER_KEY)
                {
                    return Self::Default;
                }
                Self::Map(
                    map.into_iter()
                        .map(|(key, value)| (Self::String(key), Self::from(value)))
                        .collect(),
                )
            }
        }
    }
}

#[cfg(test)]
#[path = "value_test.rs"]
mod value_test;
