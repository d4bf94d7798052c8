//! Batches and the batch accumulator
//!
//! The accumulator leases row storage from a [`RowPool`] when the first row
//! of a batch arrives and hands out a [`Batch`] once `batch_size` rows are
//! collected. Dropping the batch returns the storage to the pool, so memory
//! stays bounded by the number of batches in flight.

use std::fmt;
use std::mem;
use std::sync::Arc;

use clickload_types::{ColumnCodec, Row};

use crate::pool::RowPool;

/// Column codecs shared by every batch of a copy
pub type ColumnTypes = Arc<[Arc<dyn ColumnCodec>]>;

/// A slice of the input ready to encode
pub struct Batch {
    rows: Vec<Row>,
    pool: Arc<RowPool>,
    query: Arc<str>,
    types: ColumnTypes,
    sequence: u64,
}

impl Batch {
    /// Number of rows
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Insert statement sent ahead of the rows
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn types(&self) -> &[Arc<dyn ColumnCodec>] {
        &self.types
    }

    /// Zero-based flush order within the copy
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        self.pool.put(mem::take(&mut self.rows));
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("sequence", &self.sequence)
            .field("size", &self.rows.len())
            .field("query", &self.query)
            .finish()
    }
}

/// Collects rows into fixed-size batches
pub struct BatchAccumulator {
    batch_size: usize,
    pool: Arc<RowPool>,
    query: Arc<str>,
    types: ColumnTypes,
    rows: Option<Vec<Row>>,
    next_sequence: u64,
}

impl BatchAccumulator {
    pub fn new(
        batch_size: usize,
        pool: Arc<RowPool>,
        query: impl Into<Arc<str>>,
        types: ColumnTypes,
    ) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pool,
            query: query.into(),
            types,
            rows: None,
            next_sequence: 0,
        }
    }

    /// Append a row; returns the batch once it is full
    pub fn add(&mut self, row: Row) -> Option<Batch> {
        let rows = self.rows.get_or_insert_with(|| self.pool.get());
        rows.push(row);

        if rows.len() >= self.batch_size {
            let rows = self.rows.take()?;
            Some(self.seal(rows))
        } else {
            None
        }
    }

    /// Hand out the trailing partial batch, if any rows are pending
    pub fn finish(&mut self) -> Option<Batch> {
        match self.rows.take() {
            Some(rows) if !rows.is_empty() => Some(self.seal(rows)),
            Some(rows) => {
                self.pool.put(rows);
                None
            }
            None => None,
        }
    }

    /// Rows collected for the current batch
    pub fn pending(&self) -> usize {
        self.rows.as_ref().map_or(0, Vec::len)
    }

    /// Batches handed out so far
    pub fn batches(&self) -> u64 {
        self.next_sequence
    }

    fn seal(&mut self, rows: Vec<Row>) -> Batch {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Batch {
            rows,
            pool: Arc::clone(&self.pool),
            query: Arc::clone(&self.query),
            types: Arc::clone(&self.types),
            sequence,
        }
    }
}

impl Drop for BatchAccumulator {
    fn drop(&mut self) {
        if let Some(rows) = self.rows.take() {
            self.pool.put(rows);
        }
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;
