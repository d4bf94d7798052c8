//! Bulk copy job description

use std::collections::HashSet;

use crate::encoder::RowBinaryFormat;
use crate::error::ConfigurationError;
use crate::transport::Compression;

/// Default rows per batch
pub const DEFAULT_BATCH_SIZE: usize = 100_000;

/// Default number of batches encoded and sent at once
pub const DEFAULT_MAX_PARALLELISM: usize = 4;

/// Largest accepted batch size
pub const MAX_BATCH_SIZE: usize = 10_000_000;

/// Largest accepted parallelism, well below the semaphore permit limit
pub const MAX_PARALLELISM: usize = 1024;

/// A destination column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    /// ClickHouse type declaration, e.g. `Nullable(String)`
    pub type_declaration: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, type_declaration: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_declaration: type_declaration.into(),
        }
    }
}

/// Parameters of one bulk copy
///
/// ```
/// use clickload_bulk::{BulkCopyJob, RowBinaryFormat};
///
/// let job = BulkCopyJob::new("events")
///     .with_column("id", "UInt64")
///     .with_column("name", "String")
///     .with_batch_size(10_000)
///     .with_format(RowBinaryFormat::RowBinaryWithDefaults);
///
/// assert!(job.validate().is_ok());
/// assert_eq!(
///     job.insert_query(),
///     "INSERT INTO events (`id`, `name`) FORMAT RowBinaryWithDefaults"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCopyJob {
    pub table: String,
    pub columns: Vec<ColumnSpec>,
    pub batch_size: usize,
    pub max_parallelism: usize,
    pub format: RowBinaryFormat,
    pub compression: Compression,
}

impl BulkCopyJob {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_parallelism: DEFAULT_MAX_PARALLELISM,
            format: RowBinaryFormat::default(),
            compression: Compression::default(),
        }
    }

    #[must_use]
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        type_declaration: impl Into<String>,
    ) -> Self {
        self.columns.push(ColumnSpec::new(name, type_declaration));
        self
    }

    #[must_use]
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnSpec>) -> Self {
        self.columns.extend(columns);
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: RowBinaryFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Check the job before any row is read
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.table.trim().is_empty() {
            return Err(ConfigurationError::MissingTable);
        }
        if self.columns.is_empty() {
            return Err(ConfigurationError::NoColumns);
        }
        if self.batch_size == 0 {
            return Err(ConfigurationError::ZeroBatchSize);
        }
        if self.max_parallelism == 0 {
            return Err(ConfigurationError::ZeroParallelism);
        }
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigurationError::BatchSizeTooLarge {
                value: self.batch_size,
                max: MAX_BATCH_SIZE,
            });
        }
        if self.max_parallelism > MAX_PARALLELISM {
            return Err(ConfigurationError::ParallelismTooLarge {
                value: self.max_parallelism,
                max: MAX_PARALLELISM,
            });
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if column.name.is_empty() {
                return Err(ConfigurationError::EmptyColumnName);
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ConfigurationError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(())
    }

    /// `INSERT INTO <table> (`a`, `b`) FORMAT <format>`
    pub fn insert_query(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| quote_identifier(&column.name))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) FORMAT {}",
            self.table.trim(),
            columns,
            self.format
        )
    }
}

/// Back-tick quote an identifier
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
}

#[cfg(test)]
#[path = "job_test.rs"]
mod job_test;
