//! Clickload Configuration
//!
//! TOML-based configuration with sensible defaults. Every section is
//! optional; a copy needs at least the destination columns.
//!
//! ```
//! use clickload_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(
//!     r#"
//! [copy]
//! table = "events"
//!
//! [[copy.columns]]
//! name = "id"
//! type = "UInt64"
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.copy.columns[0].type_declaration, "UInt64");
//! assert_eq!(config.clickhouse.url, "http://localhost:8123");
//! ```

mod clickhouse;
mod copy;
mod error;
mod logging;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use clickhouse::{ClickHouseConfig, Compression};
pub use copy::{ColumnConfig, CopyConfig, InsertFormat, MAX_BATCH_SIZE, MAX_PARALLELISM};
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,

    /// Server connection
    pub clickhouse: ClickHouseConfig,

    /// Destination table and batching
    pub copy: CopyConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        validation::validate_config(&config)?;
        Ok(config)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
