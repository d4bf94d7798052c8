//! `[copy]` section

use serde::Deserialize;

/// Insert format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum InsertFormat {
    #[default]
    #[serde(rename = "RowBinary", alias = "rowbinary")]
    RowBinary,
    /// Allows `{"$default": true}` cells
    #[serde(rename = "RowBinaryWithDefaults", alias = "rowbinary_with_defaults")]
    RowBinaryWithDefaults,
}

/// A destination column
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ColumnConfig {
    pub name: String,
    /// ClickHouse type declaration
    #[serde(rename = "type")]
    pub type_declaration: String,
}

/// Bulk copy job
///
/// ```toml
/// [copy]
/// table = "events"
/// batch_size = 50000
/// max_parallelism = 8
/// format = "RowBinaryWithDefaults"
///
/// [[copy.columns]]
/// name = "id"
/// type = "UInt64"
///
/// [[copy.columns]]
/// name = "tags"
/// type = "Array(LowCardinality(String))"
/// ```
/// Largest accepted `batch_size`
pub const MAX_BATCH_SIZE: usize = 10_000_000;

/// Largest accepted `max_parallelism`
pub const MAX_PARALLELISM: usize = 1024;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CopyConfig {
    /// Destination table, may be overridden on the command line
    pub table: Option<String>,

    pub columns: Vec<ColumnConfig>,

    /// Rows per insert, at most 10000000
    /// Default: 100000
    pub batch_size: usize,

    /// Batches in flight, at most 1024
    /// Default: 4
    pub max_parallelism: usize,

    pub format: InsertFormat,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            table: None,
            columns: Vec::new(),
            batch_size: 100_000,
            max_parallelism: 4,
            format: InsertFormat::RowBinary,
        }
    }
}
