//! Column codecs
//!
//! A [`ColumnCodec`] writes one [`Value`] in ClickHouse RowBinary layout. The
//! [`TypeResolver`] turns a parsed declaration into a codec; the default
//! [`ClickHouseTypeResolver`] produces [`ClickHouseType`] codecs.
//!
//! # Wire layout
//!
//! | Type | Bytes |
//! |------|-------|
//! | integers, floats | little-endian, fixed width |
//! | `String` | LEB128 length + bytes |
//! | `FixedString(N)` | N bytes, zero padded |
//! | `Nullable(T)` | `1` for null, else `0` + T |
//! | `Array(T)` | LEB128 count + elements |
//! | `Map(K, V)` | LEB128 count + key/value pairs |
//! | `Nested(...)` | array of tuples |

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;

use crate::grammar::{StructureError, TypeNode, parse_type};
use crate::value::Value;

mod resolver;
mod types;
mod write;

pub use resolver::ClickHouseTypeResolver;
pub use types::ClickHouseType;
pub use write::{put_string, put_varint};

/// Writes values of one column type
pub trait ColumnCodec: fmt::Debug + fmt::Display + Send + Sync {
    /// Append `value` to `out`
    ///
    /// On error `out` may hold a partial value; callers truncate.
    fn write(&self, out: &mut BytesMut, value: &Value) -> Result<(), CodecError>;
}

/// Maps a parsed type declaration to its codec
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, node: &TypeNode) -> Result<Arc<dyn ColumnCodec>, TypeResolutionError>;

    /// Parse and resolve in one step
    fn resolve_declaration(
        &self,
        declaration: &str,
    ) -> Result<Arc<dyn ColumnCodec>, TypeResolutionError> {
        let node = parse_type(declaration)?;
        self.resolve(&node)
    }
}

/// A value that a codec cannot write
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("{type_name} cannot encode {kind} value {value}")]
    TypeMismatch {
        type_name: String,
        kind: &'static str,
        value: String,
    },

    #[error("{value} is out of range for {type_name}")]
    OutOfRange { type_name: String, value: String },

    #[error("invalid value for {type_name}: {reason}")]
    Invalid { type_name: String, reason: String },

    #[error("row has {found} values but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },
}

/// A declaration that cannot be turned into a codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeResolutionError {
    #[error("unknown type '{0}'")]
    Unknown(String),

    #[error("malformed type '{declaration}': {reason}")]
    Malformed { declaration: String, reason: String },

    #[error("invalid type declaration: {0}")]
    Structure(#[from] StructureError),
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
