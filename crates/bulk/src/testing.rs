//! In-memory transport for tests

use std::io::Read;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use flate2::read::GzDecoder;

use crate::error::TransportError;
use crate::transport::{Compression, InsertPayload, Transport};

/// A payload as the transport saw it
#[derive(Debug, Clone)]
pub struct SentBatch {
    pub sequence: u64,
    pub rows: usize,
    pub compression: Compression,
    pub body: Vec<u8>,
    pub started: Instant,
    pub finished: Instant,
}

impl SentBatch {
    /// Body with compression undone
    pub fn plain_body(&self) -> Vec<u8> {
        match self.compression {
            Compression::Gzip => {
                let mut plain = Vec::new();
                GzDecoder::new(&self.body[..])
                    .read_to_end(&mut plain)
                    .unwrap();
                plain
            }
            Compression::Lz4 => {
                let mut plain = Vec::new();
                lz4_flex::frame::FrameDecoder::new(&self.body[..])
                    .read_to_end(&mut plain)
                    .unwrap();
                plain
            }
            Compression::None => self.body.clone(),
        }
    }

    /// Encoded rows after the `query\n` prefix
    pub fn row_bytes(&self) -> Vec<u8> {
        let plain = self.plain_body();
        let newline = plain.iter().position(|&b| b == b'\n').unwrap();
        plain[newline + 1..].to_vec()
    }
}

/// Records payloads, optionally slowly, optionally failing one sequence
#[derive(Debug, Default)]
pub struct RecordingTransport {
    delay: Duration,
    fail_on: Option<u64>,
    sent: Mutex<Vec<SentBatch>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reject the batch with this sequence number
    pub fn failing_on(mut self, sequence: u64) -> Self {
        self.fail_on = Some(sequence);
        self
    }

    /// Accepted batches ordered by sequence
    pub fn sent(&self) -> Vec<SentBatch> {
        let mut sent = self.sent.lock().unwrap().clone();
        sent.sort_by_key(|batch| batch.sequence);
        sent
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, payload: InsertPayload) -> Result<(), TransportError> {
        let started = Instant::now();
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on == Some(payload.sequence) {
            return Err(TransportError::Server {
                status: 500,
                code: Some(1000),
                body: "injected failure".into(),
            });
        }

        self.sent.lock().unwrap().push(SentBatch {
            sequence: payload.sequence,
            rows: payload.rows,
            compression: payload.compression,
            body: payload.body.to_vec(),
            started,
            finished: Instant::now(),
        });
        Ok(())
    }
}
