//! clickload - Types
//!
//! ClickHouse type declarations, dynamic row values and the RowBinary column
//! codecs used by the bulk loader.
//!
//! # Architecture
//!
//! ```text
//! "Tuple(UInt8, String)" --tokenize--> [Text, Open, Text, Comma, Text, Close]
//!                        --parse-----> TypeNode tree
//!                        --resolve---> Arc<dyn ColumnCodec>
//! ```
//!
//! # Example
//!
//! ```
//! use clickload_types::grammar::parse_type;
//!
//! let node = parse_type("Tuple(Int32, Nullable(String))").unwrap();
//! assert_eq!(node.value(), "Tuple");
//! assert_eq!(node.children().len(), 2);
//! assert_eq!(node.to_string(), "Tuple(Int32, Nullable(String))");
//! ```

/// Type declaration grammar (tokenizer, parser, syntax tree)
pub mod grammar;

/// Column codecs and the type resolver
pub mod codec;

/// Dynamic row values
mod value;

pub use codec::{
    ClickHouseType, ClickHouseTypeResolver, CodecError, ColumnCodec, TypeResolutionError,
    TypeResolver,
};
pub use grammar::{StructureError, Token, TypeNode, parse_type, tokenize};
pub use value::{DEFAULT_MARKER_KEY, Row, RowDisplay, Value};
