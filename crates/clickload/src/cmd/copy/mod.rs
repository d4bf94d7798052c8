//! Copy command - stream JSON rows into a ClickHouse table
//!
//! # Usage
//!
//! ```bash
//! clickload copy --config clickload.toml --input rows.jsonl
//! clickload copy --config clickload.toml --table events_backfill < rows.jsonl
//! ```
//!
//! Ctrl-C stops reading; batches already handed out still finish.

mod input;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use clap::Args;
use clickload_bulk::{
    BulkCopy, BulkCopyError, BulkCopyJob, ColumnSpec, Compression, HttpTransport,
    HttpTransportConfig, RowBinaryFormat,
};
use clickload_config::{ClickHouseConfig, Config, CopyConfig, InsertFormat};
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use self::input::JsonRows;

/// Copy command arguments
#[derive(Args, Debug)]
pub struct CopyArgs {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// JSON-lines input file; stdin when omitted or "-"
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Destination table. Overrides config file.
    #[arg(short, long)]
    pub table: Option<String>,
}

/// Run the copy command
pub async fn run(args: CopyArgs, config: Config) -> Result<()> {
    let job = build_job(&config.copy, args.table.as_deref())?
        .with_compression(compression(&config.clickhouse));
    let table = job.table.clone();
    let columns: Arc<[String]> = job.columns.iter().map(|c| c.name.clone()).collect();

    let transport = HttpTransport::new(transport_config(&config.clickhouse))
        .context("failed to set up ClickHouse transport")?;
    let copy = BulkCopy::new(job, Arc::new(transport))
        .with_context(|| format!("failed to prepare copy into {table}"))?;

    let reader = open_input(args.input.as_ref()).await?;
    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let input_error = Arc::new(Mutex::new(None));
    let rows = row_stream(
        JsonRows::new(reader, columns),
        Arc::clone(&input_error),
        cancel.clone(),
    );
    let result = copy.copy_stream(rows, &cancel).await;
    interrupt.abort();

    let rows_written = match &result {
        Ok(n) => *n,
        Err(BulkCopyError::Cancelled { rows_written }) => *rows_written,
        Err(_) => copy.metrics().rows_written(),
    };

    let failed_input = input_error.lock().map_err(|_| anyhow!("input lock poisoned"))?.take();
    if let Some(e) = failed_input {
        return Err(e.context(format!(
            "stopped reading input after {rows_written} rows were written"
        )));
    }

    match result {
        Ok(rows) => {
            let snapshot = copy.metrics().snapshot();
            info!(
                rows,
                batches = snapshot.batches_written,
                compression_ratio = %format!("{:.2}", snapshot.compression_ratio()),
                "copy finished"
            );
            println!("{rows} rows written to {table}");
            Ok(())
        }
        Err(BulkCopyError::Cancelled { rows_written }) => {
            println!("{rows_written} rows written to {table} before interruption");
            Err(anyhow!("copy interrupted"))
        }
        Err(e) => Err(e).with_context(|| format!("copy into {table} failed after {rows_written} rows")),
    }
}

/// Combine the `[copy]` section with the command line
fn build_job(config: &CopyConfig, table: Option<&str>) -> Result<BulkCopyJob> {
    let table = table
        .or(config.table.as_deref())
        .ok_or_else(|| anyhow!("no destination table: set [copy] table or pass --table"))?;

    if config.columns.is_empty() {
        return Err(anyhow!("no destination columns: add [[copy.columns]] entries"));
    }

    let columns = config
        .columns
        .iter()
        .map(|c| ColumnSpec::new(c.name.clone(), c.type_declaration.clone()));

    Ok(BulkCopyJob::new(table)
        .with_columns(columns)
        .with_batch_size(config.batch_size)
        .with_max_parallelism(config.max_parallelism)
        .with_format(match config.format {
            InsertFormat::RowBinary => RowBinaryFormat::RowBinary,
            InsertFormat::RowBinaryWithDefaults => RowBinaryFormat::RowBinaryWithDefaults,
        }))
}

fn transport_config(config: &ClickHouseConfig) -> HttpTransportConfig {
    let mut transport = HttpTransportConfig::new(config.url.clone()).with_timeout(config.timeout);
    if let Some(database) = &config.database {
        transport = transport.with_database(database.clone());
    }
    if let Some(username) = &config.username {
        transport = transport.with_credentials(username.clone(), config.password.clone());
    }
    transport
}

fn compression(config: &ClickHouseConfig) -> Compression {
    match config.compression {
        clickload_config::Compression::None => Compression::None,
        clickload_config::Compression::Gzip => Compression::Gzip,
        clickload_config::Compression::Lz4 => Compression::Lz4,
    }
}

async fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Rows until the input ends or a line fails to parse
///
/// A bad line is parked in `failure` and cancels the copy so that nothing
/// after it is inserted.
fn row_stream<R>(
    rows: JsonRows<R>,
    failure: Arc<Mutex<Option<anyhow::Error>>>,
    cancel: CancellationToken,
) -> impl futures_util::Stream<Item = clickload_types::Row>
where
    R: AsyncBufRead + Unpin,
{
    futures_util::stream::unfold(rows, move |mut rows| {
        let failure = Arc::clone(&failure);
        let cancel = cancel.clone();
        async move {
            match rows.next_row().await {
                Ok(Some(row)) => Some((row, rows)),
                Ok(None) => {
                    debug!(lines = rows.line_number(), "input exhausted");
                    None
                }
                Err(e) => {
                    warn!(
                        error = %format!("{e:#}"),
                        lines = rows.line_number(),
                        "bad input row"
                    );
                    if let Ok(mut slot) = failure.lock() {
                        slot.get_or_insert(e);
                    }
                    cancel.cancel();
                    None
                }
            }
        }
    })
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received, finishing in-flight batches");
        cancel.cancel();
    }
}
