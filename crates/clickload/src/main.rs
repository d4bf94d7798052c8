//! Clickload - bulk-load rows into ClickHouse
//!
//! # Usage
//!
//! ```bash
//! # Inspect how a column type declaration parses
//! clickload parse "Nested(id UInt64, tags Array(String))" --tree
//!
//! # Load JSON lines into the configured table
//! clickload copy --config clickload.toml --input rows.jsonl
//! cat rows.jsonl | clickload copy --config clickload.toml --table events_tmp
//! ```

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clickload_config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Clickload - bulk-load rows into ClickHouse
#[derive(Parser, Debug)]
#[command(name = "clickload")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a ClickHouse type declaration
    Parse(cmd::parse::ParseArgs),

    /// Copy JSON rows into a table
    Copy(cmd::copy::CopyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Parse(args) => {
            // Parse only prints to stdout
            cmd::parse::run(args)
        }
        Command::Copy(args) => {
            let config = Config::from_file(&args.config)?;
            let level = resolve_log_level(cli.log_level.as_deref(), Some(&config));
            init_logging(&level, config.log.format)?;
            cmd::copy::run(args, config).await
        }
    }
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<&str>, config: Option<&Config>) -> String {
    if let Some(level) = cli_level {
        return level.to_string();
    }

    if let Some(level) = config.and_then(|c| c.log.level) {
        return level.as_str().to_string();
    }

    "info".to_string()
}

/// Initialize the tracing subscriber on stderr
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Console => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
