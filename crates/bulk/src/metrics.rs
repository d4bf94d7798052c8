//! Bulk copy metrics
//!
//! Atomic counters updated by the copy loop and the batch tasks.

use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// Metrics
// =============================================================================

/// Counters for one [`BulkCopy`](crate::BulkCopy) instance
#[derive(Debug, Default)]
pub struct BulkCopyMetrics {
    /// Rows read from the source
    pub rows_received: AtomicU64,

    /// Rows acknowledged by the server
    pub rows_written: AtomicU64,

    /// Batches handed to a task
    pub batches_flushed: AtomicU64,

    /// Batches acknowledged by the server
    pub batches_written: AtomicU64,

    /// Batches dropped after another batch failed
    pub batches_skipped: AtomicU64,

    /// Uncompressed RowBinary bytes
    pub bytes_encoded: AtomicU64,

    /// Request body bytes after compression
    pub bytes_sent: AtomicU64,

    pub serialization_errors: AtomicU64,

    pub transport_errors: AtomicU64,
}

impl BulkCopyMetrics {
    pub const fn new() -> Self {
        Self {
            rows_received: AtomicU64::new(0),
            rows_written: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
            batches_skipped: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            serialization_errors: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_row_received(&self) {
        self.rows_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch_flushed(&self) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch the server accepted
    #[inline]
    pub fn record_batch_written(&self, rows: usize, body_bytes: usize) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.rows_written.fetch_add(rows as u64, Ordering::Relaxed);
        self.bytes_sent.fetch_add(body_bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch_skipped(&self) {
        self.batches_skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_bytes_encoded(&self, bytes: usize) {
        self.bytes_encoded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_serialization_error(&self) {
        self.serialization_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Rows acknowledged so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_received: self.rows_received.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            batches_skipped: self.batches_skipped.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            serialization_errors: self.serialization_errors.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Point-in-time copy of [`BulkCopyMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rows_received: u64,
    pub rows_written: u64,
    pub batches_flushed: u64,
    pub batches_written: u64,
    pub batches_skipped: u64,
    pub bytes_encoded: u64,
    pub bytes_sent: u64,
    pub serialization_errors: u64,
    pub transport_errors: u64,
}

impl MetricsSnapshot {
    /// Encoded bytes per sent byte (1.0 before anything was sent)
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_sent == 0 {
            1.0
        } else {
            self.bytes_encoded as f64 / self.bytes_sent as f64
        }
    }
}
