//! Bulk copy errors

use std::io;

use clickload_types::{CodecError, Row, RowDisplay, TypeResolutionError};

/// Errors from a bulk copy
#[derive(Debug, thiserror::Error)]
pub enum BulkCopyError {
    #[error("invalid bulk copy configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A destination column type is unknown or malformed
    #[error("column '{column}': {source}")]
    TypeResolution {
        column: String,
        #[source]
        source: TypeResolutionError,
    },

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// External cancellation; every dispatched batch reached an outcome
    #[error("bulk copy cancelled after {rows_written} rows")]
    Cancelled { rows_written: u64 },

    #[error("batch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Rejected job parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("destination table is not set")]
    MissingTable,

    #[error("no destination columns")]
    NoColumns,

    #[error("column name is empty")]
    EmptyColumnName,

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("batch size must be positive")]
    ZeroBatchSize,

    #[error("max parallelism must be positive")]
    ZeroParallelism,

    #[error("batch size {value} exceeds the limit of {max}")]
    BatchSizeTooLarge { value: usize, max: usize },

    #[error("max parallelism {value} exceeds the limit of {max}")]
    ParallelismTooLarge { value: usize, max: usize },
}

/// A row that could not be encoded
///
/// Carries a snapshot of the row so the caller can report or retry it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "failed to serialize row {row_index} {} at column {column}: {source}",
    RowDisplay(.row)
)]
pub struct SerializationError {
    pub row: Row,
    /// Position within the batch
    pub row_index: usize,
    pub column: usize,
    #[source]
    pub source: CodecError,
}

/// Failure while framing or sending a payload
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Non-success HTTP status from the server
    #[error("server returned HTTP {status}{}: {body}", code_suffix(.code))]
    Server {
        status: u16,
        code: Option<u32>,
        body: String,
    },

    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("compression failed: {0}")]
    Io(#[from] io::Error),
}

fn code_suffix(code: &Option<u32>) -> String {
    code.map(|c| format!(" (code {c})")).unwrap_or_default()
}
