//! Batch transport
//!
//! Each encoded batch becomes one self-contained request body: the insert
//! statement, a newline, then the RowBinary rows, all inside a single
//! compression stream. The body is handed to a [`Transport`].

use std::fmt;
use std::io::Write;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use flate2::write::GzEncoder;
use lz4_flex::frame::FrameEncoder;

use crate::error::TransportError;

mod http;

pub use http::{HttpTransport, HttpTransportConfig};

/// Request body compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    None,
    #[default]
    Gzip,
    /// LZ4 frame format
    Lz4,
}

impl Compression {
    /// `Content-Encoding` header value
    pub fn content_encoding(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Gzip => Some("gzip"),
            Self::Lz4 => Some("lz4"),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_encoding().unwrap_or("none"))
    }
}

/// A framed, compressed insert ready to send
#[derive(Debug, Clone)]
pub struct InsertPayload {
    /// Flush order of the batch within its copy
    pub sequence: u64,
    pub rows: usize,
    pub compression: Compression,
    pub body: Bytes,
}

/// Delivers insert payloads to the server
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: InsertPayload) -> Result<(), TransportError>;
}

/// Frame `query` and encoded `rows` into one compressed body
pub fn frame_payload(
    query: &str,
    rows: &[u8],
    compression: Compression,
) -> Result<Bytes, TransportError> {
    let size_hint = query.len() + 1 + rows.len();

    match compression {
        Compression::None => {
            let mut body = BytesMut::with_capacity(size_hint);
            body.put_slice(query.as_bytes());
            body.put_u8(b'\n');
            body.put_slice(rows);
            Ok(body.freeze())
        }
        Compression::Gzip => {
            let sink = BytesMut::with_capacity(size_hint / 4).writer();
            let mut encoder = GzEncoder::new(sink, flate2::Compression::fast());
            write_frame(&mut encoder, query, rows)?;
            Ok(encoder.finish()?.into_inner().freeze())
        }
        Compression::Lz4 => {
            let sink = BytesMut::with_capacity(size_hint / 2).writer();
            let mut encoder = FrameEncoder::new(sink);
            write_frame(&mut encoder, query, rows)?;
            let sink = encoder.finish().map_err(std::io::Error::from)?;
            Ok(sink.into_inner().freeze())
        }
    }
}

fn write_frame(writer: &mut impl Write, query: &str, rows: &[u8]) -> std::io::Result<()> {
    writer.write_all(query.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.write_all(rows)
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;
