//! RowBinary row encoder
//!
//! Dense `RowBinary` writes every value in column order. `RowBinaryWithDefaults`
//! prefixes each value with a flag byte: `1` means "use the column default"
//! and is followed by nothing, `0` is followed by the value.

use std::fmt;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use clickload_types::{CodecError, ColumnCodec, Row, Value};

use crate::batch::Batch;
use crate::error::SerializationError;

/// Insert format variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowBinaryFormat {
    #[default]
    RowBinary,
    RowBinaryWithDefaults,
}

impl RowBinaryFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RowBinary => "RowBinary",
            Self::RowBinaryWithDefaults => "RowBinaryWithDefaults",
        }
    }
}

impl fmt::Display for RowBinaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encodes whole batches into a byte buffer
#[derive(Debug, Clone, Copy, Default)]
pub struct RowEncoder {
    format: RowBinaryFormat,
}

impl RowEncoder {
    pub fn new(format: RowBinaryFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> RowBinaryFormat {
        self.format
    }

    /// Append every row of `batch` to `out`
    ///
    /// On failure `out` is restored to its previous length and the error
    /// names the offending row and column.
    pub fn encode(&self, batch: &Batch, out: &mut BytesMut) -> Result<(), SerializationError> {
        self.encode_rows(batch.rows(), batch.types(), out)
    }

    pub fn encode_rows(
        &self,
        rows: &[Row],
        types: &[Arc<dyn ColumnCodec>],
        out: &mut BytesMut,
    ) -> Result<(), SerializationError> {
        let start = out.len();

        for (row_index, row) in rows.iter().enumerate() {
            if let Err((column, source)) = self.encode_row(row, types, out) {
                out.truncate(start);
                return Err(SerializationError {
                    row: row.clone(),
                    row_index,
                    column,
                    source,
                });
            }
        }
        Ok(())
    }

    fn encode_row(
        &self,
        row: &[Value],
        types: &[Arc<dyn ColumnCodec>],
        out: &mut BytesMut,
    ) -> Result<(), (usize, CodecError)> {
        if row.len() != types.len() {
            let width = CodecError::RowWidth {
                expected: types.len(),
                found: row.len(),
            };
            return Err((row.len().min(types.len()), width));
        }

        for (column, (codec, value)) in types.iter().zip(row).enumerate() {
            let written = match self.format {
                RowBinaryFormat::RowBinary => codec.write(out, value),
                RowBinaryFormat::RowBinaryWithDefaults if value.is_default() => {
                    out.put_u8(1);
                    Ok(())
                }
                RowBinaryFormat::RowBinaryWithDefaults => {
                    out.put_u8(0);
                    codec.write(out, value)
                }
            };
            written.map_err(|e| (column, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "encoder_test.rs"]
mod encoder_test;
