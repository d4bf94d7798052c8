//! Type declaration grammar
//!
//! ClickHouse describes column types with a small parenthesised grammar:
//!
//! ```text
//! Int32
//! Nullable(String)
//! Tuple(Int32, Tuple(UInt8, String, Nullable(Int32)))
//! Nested(id UInt64, tags Array(String))
//! Enum8('a' = 1, 'b' = 2)
//! ```
//!
//! The [`tokenize`] scanner only knows the three structural markers `(`, `)`
//! and `,`. Everything else, including quoted arguments, is opaque text.
//! [`parse_type`] folds the token stream into a [`TypeNode`] tree without
//! recursion, using an explicit stack of open nodes.

mod node;
mod parser;
mod tokenizer;

pub use node::TypeNode;
pub use parser::{NESTED, StructureError, parse_type};
pub use tokenizer::{Token, Tokenizer, tokenize};
