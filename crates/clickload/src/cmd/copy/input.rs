//! JSON-lines row input
//!
//! Each non-blank line is one row, either a JSON array in column order or a
//! JSON object keyed by column name. Object keys that are not columns are
//! rejected; absent columns become `DEFAULT`.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clickload_types::{Row, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// Convert one line into a row
pub fn parse_row(line: &str, columns: &[String]) -> Result<Row> {
    let json: serde_json::Value = serde_json::from_str(line).context("invalid JSON")?;

    match json {
        serde_json::Value::Array(cells) => Ok(cells.into_iter().map(Value::from).collect()),
        serde_json::Value::Object(mut fields) => {
            let row = columns
                .iter()
                .map(|name| fields.remove(name).map_or(Value::Default, Value::from))
                .collect();
            if let Some(unknown) = fields.keys().next() {
                bail!("unknown column '{unknown}'");
            }
            Ok(row)
        }
        other => bail!("expected a JSON array or object, found {other}"),
    }
}

/// Reads rows line by line
pub struct JsonRows<R> {
    lines: Lines<R>,
    columns: Arc<[String]>,
    line_number: usize,
}

impl<R: AsyncBufRead + Unpin> JsonRows<R> {
    pub fn new(reader: R, columns: Arc<[String]>) -> Self {
        Self {
            lines: reader.lines(),
            columns,
            line_number: 0,
        }
    }

    /// Next row, or `None` at end of input
    pub async fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            let Some(line) = self.lines.next_line().await.context("failed to read input")? else {
                return Ok(None);
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            let row = parse_row(&line, &self.columns)
                .with_context(|| format!("line {}", self.line_number))?;
            return Ok(Some(row));
        }
    }

    /// Lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;
