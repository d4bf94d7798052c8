//! Default ClickHouse type resolver

use std::str::FromStr;
use std::sync::Arc;

use tracing::trace;

use super::{ClickHouseType, ColumnCodec, TypeResolutionError, TypeResolver};
use crate::grammar::{NESTED, TypeNode};

const MAX_DECIMAL_PRECISION: u32 = 76;
const MAX_DATETIME64_PRECISION: u32 = 9;

/// Resolves declarations into [`ClickHouseType`] codecs
///
/// Virtual wrappers produced by the parser are transparent: a wrapped
/// `Nested` resolves exactly like a bare one (an array of tuples).
/// Named tuple elements and `Nested` members resolve by their type part.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClickHouseTypeResolver;

impl ClickHouseTypeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a node into the concrete type enum
    pub fn resolve_type(&self, node: &TypeNode) -> Result<ClickHouseType, TypeResolutionError> {
        let node = node.unwrap_virtual();
        let (_, name) = split_member(node);
        let args = node.children();

        if args.is_empty()
            && let Some(ty) = scalar(name)
        {
            return Ok(ty);
        }

        let ty = match name {
            "Nullable" => ClickHouseType::Nullable(Box::new(self.resolve_type(single(node)?)?)),
            "Array" => ClickHouseType::Array(Box::new(self.resolve_type(single(node)?)?)),
            "LowCardinality" => {
                ClickHouseType::LowCardinality(Box::new(self.resolve_type(single(node)?)?))
            }
            "Tuple" => {
                if args.is_empty() {
                    return Err(malformed(node, "a tuple needs at least one element"));
                }
                ClickHouseType::Tuple(
                    args.iter()
                        .map(|arg| self.resolve_type(arg))
                        .collect::<Result<_, _>>()?,
                )
            }
            "Map" => {
                let [key, value] = args else {
                    return Err(malformed(node, "expected a key and a value type"));
                };
                ClickHouseType::Map(
                    Box::new(self.resolve_type(key)?),
                    Box::new(self.resolve_type(value)?),
                )
            }
            NESTED => ClickHouseType::Nested(self.members(node)?),
            "FixedString" => {
                let width: usize = number(node, single(node)?)?;
                if width == 0 {
                    return Err(malformed(node, "width must be positive"));
                }
                ClickHouseType::FixedString(width)
            }
            "DateTime" => ClickHouseType::DateTime(Some(unquote(single(node)?.value()))),
            "DateTime64" => {
                let (precision, timezone) = match args {
                    [precision] => (precision, None),
                    [precision, tz] => (precision, Some(unquote(tz.value()))),
                    _ => return Err(malformed(node, "expected precision and optional timezone")),
                };
                let precision: u32 = number(node, precision)?;
                if precision > MAX_DATETIME64_PRECISION {
                    return Err(malformed(node, "precision must be between 0 and 9"));
                }
                ClickHouseType::DateTime64 {
                    precision,
                    timezone,
                }
            }
            "Decimal" => {
                let [precision, scale] = args else {
                    return Err(malformed(node, "expected precision and scale"));
                };
                decimal(node, number(node, precision)?, number(node, scale)?)?
            }
            "Decimal32" => decimal(node, 9, number(node, single(node)?)?)?,
            "Decimal64" => decimal(node, 18, number(node, single(node)?)?)?,
            "Decimal128" => decimal(node, 38, number(node, single(node)?)?)?,
            "Decimal256" => decimal(node, 76, number(node, single(node)?)?)?,
            "Enum8" => ClickHouseType::Enum8(enum_members(node)?),
            "Enum16" => ClickHouseType::Enum16(enum_members(node)?),
            "Enum" => match enum_members::<i8>(node) {
                Ok(members) => ClickHouseType::Enum8(members),
                Err(_) => ClickHouseType::Enum16(enum_members(node)?),
            },
            "SimpleAggregateFunction" => {
                let [_, ty] = args else {
                    return Err(malformed(node, "expected a function and a type"));
                };
                self.resolve_type(ty)?
            }
            _ => return Err(TypeResolutionError::Unknown(node.to_string())),
        };

        Ok(ty)
    }

    fn members(&self, node: &TypeNode) -> Result<Vec<(String, ClickHouseType)>, TypeResolutionError> {
        if node.children().is_empty() {
            return Err(malformed(node, "nested needs at least one member"));
        }
        node.children()
            .iter()
            .map(|member| {
                let (name, _) = split_member(member);
                let name = name
                    .ok_or_else(|| malformed(node, format!("member '{member}' has no name")))?;
                Ok((name.to_string(), self.resolve_type(member)?))
            })
            .collect()
    }
}

impl TypeResolver for ClickHouseTypeResolver {
    fn resolve(&self, node: &TypeNode) -> Result<Arc<dyn ColumnCodec>, TypeResolutionError> {
        let ty = self.resolve_type(node)?;
        trace!(declaration = %node, resolved = %ty, "resolved column type");
        Ok(Arc::new(ty))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn scalar(name: &str) -> Option<ClickHouseType> {
    let ty = match name {
        "Nothing" => ClickHouseType::Nothing,
        "Bool" => ClickHouseType::Bool,
        "Int8" => ClickHouseType::Int8,
        "Int16" => ClickHouseType::Int16,
        "Int32" => ClickHouseType::Int32,
        "Int64" => ClickHouseType::Int64,
        "Int128" => ClickHouseType::Int128,
        "Int256" => ClickHouseType::Int256,
        "UInt8" => ClickHouseType::UInt8,
        "UInt16" => ClickHouseType::UInt16,
        "UInt32" => ClickHouseType::UInt32,
        "UInt64" => ClickHouseType::UInt64,
        "UInt128" => ClickHouseType::UInt128,
        "UInt256" => ClickHouseType::UInt256,
        "Float32" => ClickHouseType::Float32,
        "Float64" => ClickHouseType::Float64,
        "String" => ClickHouseType::String,
        "UUID" => ClickHouseType::Uuid,
        "Date" => ClickHouseType::Date,
        "Date32" => ClickHouseType::Date32,
        "DateTime" => ClickHouseType::DateTime(None),
        "IPv4" => ClickHouseType::IPv4,
        "IPv6" => ClickHouseType::IPv6,
        _ => return None,
    };
    Some(ty)
}

/// `(name, type)` of a member token such as `"id UInt64"`
fn split_member(node: &TypeNode) -> (Option<&str>, &str) {
    if let Some(name) = node.name() {
        return (Some(name), node.parsed_value());
    }
    match node.value().rsplit_once(' ') {
        Some((name, ty)) => (Some(name.trim()), ty),
        None => (None, node.value()),
    }
}

fn malformed(node: &TypeNode, reason: impl Into<String>) -> TypeResolutionError {
    TypeResolutionError::Malformed {
        declaration: node.to_string(),
        reason: reason.into(),
    }
}

fn single(node: &TypeNode) -> Result<&TypeNode, TypeResolutionError> {
    node.single_child()
        .ok_or_else(|| malformed(node, "expected exactly one parameter"))
}

fn number<T: FromStr>(owner: &TypeNode, arg: &TypeNode) -> Result<T, TypeResolutionError> {
    if !arg.is_scalar() {
        return Err(malformed(owner, format!("'{arg}' is not a number")));
    }
    arg.value()
        .parse()
        .map_err(|_| malformed(owner, format!("'{arg}' is not a number")))
}

fn decimal(node: &TypeNode, precision: u32, scale: u32) -> Result<ClickHouseType, TypeResolutionError> {
    if precision == 0 || precision > MAX_DECIMAL_PRECISION {
        return Err(malformed(node, "precision must be between 1 and 76"));
    }
    if scale > precision {
        return Err(malformed(node, "scale exceeds precision"));
    }
    Ok(ClickHouseType::Decimal { precision, scale })
}

/// Strip surrounding single quotes and unescape `\'`
fn unquote(text: &str) -> String {
    let text = text.trim();
    let inner = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text);
    inner.replace("\\'", "'")
}

/// Parse `'name' = value` pairs
fn enum_members<T: FromStr>(node: &TypeNode) -> Result<Vec<(String, T)>, TypeResolutionError> {
    if node.children().is_empty() {
        return Err(malformed(node, "an enum needs at least one member"));
    }
    node.children()
        .iter()
        .map(|member| {
            let (name, value) = member
                .value()
                .rsplit_once('=')
                .ok_or_else(|| malformed(node, format!("member {member} has no value")))?;
            let value = value
                .trim()
                .parse()
                .map_err(|_| malformed(node, format!("member {member} has an invalid value")))?;
            Ok((unquote(name), value))
        })
        .collect()
}
