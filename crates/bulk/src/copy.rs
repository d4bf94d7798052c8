//! Bulk copy orchestrator
//!
//! Reads rows from a source, cuts them into batches and runs up to
//! `max_parallelism` batch tasks at once. Each task encodes its batch,
//! frames it and sends it through the [`Transport`].
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Accumulating <-> Flushing -> Completed
//!                                   -> Failed     (first batch error)
//!                                   -> Cancelled  (external token)
//! ```
//!
//! On the first failing batch the copy stops reading, tasks that have not
//! started transmitting skip their batch, transmitting tasks are awaited and
//! that first error is returned. On external cancellation every dispatched
//! batch is awaited and [`BulkCopyError::Cancelled`] reports the rows the
//! server accepted.
//!
//! Concurrent calls on one [`BulkCopy`] share its pools and cumulative
//! metrics. Each call counts its own written rows; [`BulkCopy::state`]
//! reflects whichever call transitioned last.

use std::fmt;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use clickload_types::{ClickHouseTypeResolver, Row, TypeResolver};
use futures_util::{Stream, StreamExt};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::batch::{Batch, BatchAccumulator, ColumnTypes};
use crate::encoder::RowEncoder;
use crate::error::BulkCopyError;
use crate::job::BulkCopyJob;
use crate::metrics::BulkCopyMetrics;
use crate::pool::{BufferPool, RowPool};
use crate::transport::{Compression, InsertPayload, Transport, frame_payload};

/// Starting capacity of pooled encode buffers
const ENCODE_BUFFER_CAPACITY: usize = 64 * 1024;

/// Progress of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CopyState {
    Idle = 0,
    Accumulating = 1,
    Flushing = 2,
    Completed = 3,
    Failed = 4,
    Cancelled = 5,
}

impl CopyState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Accumulating,
            2 => Self::Flushing,
            3 => Self::Completed,
            4 => Self::Failed,
            5 => Self::Cancelled,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for CopyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Accumulating => "accumulating",
            Self::Flushing => "flushing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Why the feeding loop stopped early
enum Stop {
    Cancelled,
    Failed(BulkCopyError),
}

/// What a batch task did with its batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchOutcome {
    Written,
    Skipped,
}

type BatchResult = Result<BatchOutcome, BulkCopyError>;

/// Batch tasks of one copy call
struct InFlight {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<BatchResult>,
    abort: CancellationToken,
    /// Rows accepted by the server during this call
    rows_written: Arc<AtomicU64>,
}

/// Parallel RowBinary bulk copy into one table
///
/// ```no_run
/// use std::sync::Arc;
///
/// use clickload_bulk::{BulkCopy, BulkCopyJob, HttpTransport, HttpTransportConfig};
/// use clickload_types::Value;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new(HttpTransportConfig::default())?;
/// let job = BulkCopyJob::new("events")
///     .with_column("id", "UInt64")
///     .with_column("name", "String");
///
/// let copy = BulkCopy::new(job, Arc::new(transport))?;
/// let rows = (0..1000u64).map(|i| vec![Value::from(i), Value::from(format!("row {i}"))]);
/// let written = copy.copy(rows, &CancellationToken::new()).await?;
/// assert_eq!(written, 1000);
/// # Ok(())
/// # }
/// ```
pub struct BulkCopy {
    job: BulkCopyJob,
    transport: Arc<dyn Transport>,
    types: ColumnTypes,
    query: Arc<str>,
    encoder: RowEncoder,
    row_pool: Arc<RowPool>,
    buffer_pool: Arc<BufferPool>,
    metrics: Arc<BulkCopyMetrics>,
    state: AtomicU8,
}

impl BulkCopy {
    /// Validate the job and resolve every column with the default resolver
    pub fn new(job: BulkCopyJob, transport: Arc<dyn Transport>) -> Result<Self, BulkCopyError> {
        Self::with_resolver(job, transport, &ClickHouseTypeResolver::new())
    }

    /// Validate the job and resolve every column with `resolver`
    pub fn with_resolver(
        job: BulkCopyJob,
        transport: Arc<dyn Transport>,
        resolver: &dyn TypeResolver,
    ) -> Result<Self, BulkCopyError> {
        job.validate()?;

        let types = job
            .columns
            .iter()
            .map(|column| {
                resolver
                    .resolve_declaration(&column.type_declaration)
                    .map_err(|source| BulkCopyError::TypeResolution {
                        column: column.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // One idle batch per running task plus the one being filled
        let pool_size = job.max_parallelism.saturating_add(1);

        Ok(Self {
            query: job.insert_query().into(),
            types: types.into(),
            encoder: RowEncoder::new(job.format),
            row_pool: Arc::new(RowPool::new(pool_size, job.batch_size)),
            buffer_pool: Arc::new(BufferPool::with_prefill(pool_size, ENCODE_BUFFER_CAPACITY)),
            metrics: Arc::new(BulkCopyMetrics::new()),
            state: AtomicU8::new(CopyState::Idle as u8),
            transport,
            job,
        })
    }

    pub fn job(&self) -> &BulkCopyJob {
        &self.job
    }

    /// Insert statement sent with every batch
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn metrics(&self) -> &BulkCopyMetrics {
        &self.metrics
    }

    /// Latest state of the most recent copy call
    pub fn state(&self) -> CopyState {
        CopyState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Copy rows from an iterator; returns the number of rows written
    pub async fn copy<I>(&self, rows: I, cancel: &CancellationToken) -> Result<u64, BulkCopyError>
    where
        I: IntoIterator<Item = Row>,
    {
        self.copy_stream(futures_util::stream::iter(rows), cancel)
            .await
    }

    /// Copy rows from a stream; returns the number of rows written
    pub async fn copy_stream<S>(&self, rows: S, cancel: &CancellationToken) -> Result<u64, BulkCopyError>
    where
        S: Stream<Item = Row>,
    {
        info!(
            table = %self.job.table,
            columns = self.types.len(),
            batch_size = self.job.batch_size,
            max_parallelism = self.job.max_parallelism,
            format = %self.job.format,
            compression = %self.job.compression,
            "bulk copy starting"
        );

        let mut in_flight = InFlight {
            semaphore: Arc::new(Semaphore::new(self.job.max_parallelism)),
            tasks: JoinSet::new(),
            abort: CancellationToken::new(),
            rows_written: Arc::new(AtomicU64::new(0)),
        };

        let stop = self.feed(rows, cancel, &mut in_flight).await.err();
        let cancelled = matches!(stop, Some(Stop::Cancelled));
        let mut first_error = match stop {
            Some(Stop::Failed(e)) => {
                in_flight.abort.cancel();
                Some(e)
            }
            _ => None,
        };

        self.drain(&mut in_flight, &mut first_error).await;
        let rows_written = in_flight.rows_written.load(Ordering::Acquire);

        if cancelled {
            if let Some(e) = first_error {
                debug!(error = %e, "batch failure during cancellation");
            }
            self.set_state(CopyState::Cancelled);
            warn!(table = %self.job.table, rows_written, "bulk copy cancelled");
            return Err(BulkCopyError::Cancelled { rows_written });
        }

        if let Some(e) = first_error {
            self.set_state(CopyState::Failed);
            error!(table = %self.job.table, rows_written, error = %e, "bulk copy failed");
            return Err(e);
        }

        self.set_state(CopyState::Completed);
        let snapshot = self.metrics.snapshot();
        info!(
            table = %self.job.table,
            rows_written,
            batches = snapshot.batches_written,
            bytes_sent = snapshot.bytes_sent,
            "bulk copy completed"
        );
        Ok(rows_written)
    }

    /// Read the source and dispatch full batches until it ends or the copy stops
    async fn feed<S>(
        &self,
        rows: S,
        cancel: &CancellationToken,
        in_flight: &mut InFlight,
    ) -> Result<(), Stop>
    where
        S: Stream<Item = Row>,
    {
        self.set_state(CopyState::Accumulating);

        let mut rows = pin!(rows);
        let mut accumulator = BatchAccumulator::new(
            self.job.batch_size,
            Arc::clone(&self.row_pool),
            Arc::clone(&self.query),
            Arc::clone(&self.types),
        );

        loop {
            while let Some(joined) = in_flight.tasks.try_join_next() {
                settle(joined).map_err(Stop::Failed)?;
            }

            let row = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Stop::Cancelled),
                row = rows.next() => row,
            };
            let Some(row) = row else {
                break;
            };

            self.metrics.record_row_received();
            if let Some(batch) = accumulator.add(row) {
                self.dispatch(batch, cancel, in_flight).await?;
            }
        }

        if let Some(batch) = accumulator.finish() {
            self.dispatch(batch, cancel, in_flight).await?;
        }
        Ok(())
    }

    /// Wait for a permit and spawn the batch task
    ///
    /// Finished tasks are reaped while waiting so a failure stops the copy
    /// without waiting for a free slot.
    async fn dispatch(
        &self,
        batch: Batch,
        cancel: &CancellationToken,
        in_flight: &mut InFlight,
    ) -> Result<(), Stop> {
        if cancel.is_cancelled() {
            return Err(Stop::Cancelled);
        }
        self.set_state(CopyState::Flushing);

        let permit = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Stop::Cancelled),
                Some(joined) = in_flight.tasks.join_next(), if !in_flight.tasks.is_empty() => {
                    settle(joined).map_err(Stop::Failed)?;
                }
                permit = Arc::clone(&in_flight.semaphore).acquire_owned() => {
                    // The semaphore is never closed
                    let Ok(permit) = permit else {
                        return Err(Stop::Cancelled);
                    };
                    break permit;
                }
            }
        };

        debug!(sequence = batch.sequence(), rows = batch.size(), "batch flushed");
        self.metrics.record_batch_flushed();

        let task = BatchTask {
            batch,
            permit,
            query: Arc::clone(&self.query),
            encoder: self.encoder,
            compression: self.job.compression,
            transport: Arc::clone(&self.transport),
            buffer_pool: Arc::clone(&self.buffer_pool),
            metrics: Arc::clone(&self.metrics),
            abort: in_flight.abort.clone(),
            rows_written: Arc::clone(&in_flight.rows_written),
        };
        in_flight.tasks.spawn(task.run());

        self.set_state(CopyState::Accumulating);
        Ok(())
    }

    /// Await every dispatched task, keeping the first error
    async fn drain(&self, in_flight: &mut InFlight, first_error: &mut Option<BulkCopyError>) {
        while let Some(joined) = in_flight.tasks.join_next().await {
            let Err(e) = settle(joined) else {
                continue;
            };
            if first_error.is_none() {
                in_flight.abort.cancel();
                *first_error = Some(e);
            } else {
                warn!(error = %e, "additional batch failure");
            }
        }
    }

    fn set_state(&self, state: CopyState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

fn settle(joined: Result<BatchResult, JoinError>) -> Result<(), BulkCopyError> {
    match joined {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(e) => Err(BulkCopyError::Task(e)),
    }
}

// =============================================================================
// Batch task
// =============================================================================

/// Encode, frame and send one batch while holding a permit
struct BatchTask {
    batch: Batch,
    permit: OwnedSemaphorePermit,
    query: Arc<str>,
    encoder: RowEncoder,
    compression: Compression,
    transport: Arc<dyn Transport>,
    buffer_pool: Arc<BufferPool>,
    metrics: Arc<BulkCopyMetrics>,
    abort: CancellationToken,
    rows_written: Arc<AtomicU64>,
}

impl BatchTask {
    async fn run(self) -> BatchResult {
        let Self {
            batch,
            permit: _permit,
            query,
            encoder,
            compression,
            transport,
            buffer_pool,
            metrics,
            abort,
            rows_written,
        } = self;

        let sequence = batch.sequence();
        let rows = batch.size();

        if abort.is_cancelled() {
            metrics.record_batch_skipped();
            return Ok(BatchOutcome::Skipped);
        }

        let mut buffer = buffer_pool.get();
        let encoded = encoder.encode(&batch, &mut buffer);
        drop(batch);

        if let Err(e) = encoded {
            buffer_pool.put(buffer);
            metrics.record_serialization_error();
            warn!(sequence, row = e.row_index, column = e.column, error = %e.source, "batch serialization failed");
            return Err(e.into());
        }
        metrics.record_bytes_encoded(buffer.len());

        if abort.is_cancelled() {
            buffer_pool.put(buffer);
            metrics.record_batch_skipped();
            return Ok(BatchOutcome::Skipped);
        }

        let framed = frame_payload(&query, &buffer, compression);
        buffer_pool.put(buffer);
        let body = framed.inspect_err(|_| metrics.record_transport_error())?;
        let body_bytes = body.len();

        let payload = InsertPayload {
            sequence,
            rows,
            compression,
            body,
        };
        if let Err(e) = transport.send(payload).await {
            metrics.record_transport_error();
            return Err(e.into());
        }

        rows_written.fetch_add(rows as u64, Ordering::AcqRel);
        metrics.record_batch_written(rows, body_bytes);
        debug!(sequence, rows, body_bytes, "batch written");
        Ok(BatchOutcome::Written)
    }
}

#[cfg(test)]
#[path = "copy_test.rs"]
mod copy_test;
