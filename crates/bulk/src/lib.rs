//! Clickload Bulk - parallel RowBinary bulk copy into ClickHouse
//!
//! # Architecture
//!
//! ```text
//! rows ──► BatchAccumulator ──► Batch ──► BatchTask (≤ max_parallelism)
//!              │ RowPool                     │ RowEncoder ──► BufferPool
//!              │                             │ frame_payload (query\n + rows, gzip/lz4)
//!              ▼                             ▼
//!          BulkCopy ◄──────── first error ── Transport (HTTP POST)
//! ```
//!
//! A [`BulkCopy`] is built from a [`BulkCopyJob`] and a [`Transport`]. Column
//! types are resolved once up front; rows are then streamed, cut into batches
//! and sent concurrently. The first failing batch stops the copy and is
//! returned to the caller.

mod batch;
mod copy;
mod encoder;
mod error;
mod job;
mod metrics;
pub mod pool;
pub mod transport;

#[cfg(test)]
mod testing;

pub use batch::{Batch, BatchAccumulator, ColumnTypes};
pub use copy::{BulkCopy, CopyState};
pub use encoder::{RowBinaryFormat, RowEncoder};
pub use error::{
    BulkCopyError, ConfigurationError, SerializationError, TransportError,
};
pub use job::{
    BulkCopyJob, ColumnSpec, DEFAULT_BATCH_SIZE, DEFAULT_MAX_PARALLELISM, MAX_BATCH_SIZE,
    MAX_PARALLELISM, quote_identifier,
};
pub use metrics::{BulkCopyMetrics, MetricsSnapshot};
pub use transport::{Compression, HttpTransport, HttpTransportConfig, InsertPayload, Transport};
