//! `[clickhouse]` section

use std::time::Duration;

use serde::Deserialize;

/// Request body compression
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    #[default]
    Gzip,
    Lz4,
}

/// ClickHouse HTTP connection
///
/// ```toml
/// [clickhouse]
/// url = "http://localhost:8123"
/// database = "analytics"
/// username = "loader"
/// password = "secret"
/// timeout = "30s"
/// compression = "gzip"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClickHouseConfig {
    /// HTTP interface URL
    /// Default: http://localhost:8123
    pub url: String,

    /// Database for unqualified table names
    /// Default: server default
    pub database: Option<String>,

    pub username: Option<String>,

    pub password: Option<String>,

    /// Per-request timeout
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Default: gzip
    pub compression: Compression,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".into(),
            database: None,
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
            compression: Compression::Gzip,
        }
    }
}
