//! Configuration validation
//!
//! Checks values serde cannot:
//! - Batch size and parallelism are positive and within limits
//! - Column names are present and unique
//! - Column types are not blank
//! - The server URL is set

use std::collections::HashSet;

use crate::Config;
use crate::copy::{MAX_BATCH_SIZE, MAX_PARALLELISM};
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_clickhouse(config)?;
    validate_copy(config)?;
    Ok(())
}

fn validate_clickhouse(config: &Config) -> Result<()> {
    if config.clickhouse.url.trim().is_empty() {
        return Err(ConfigError::missing_field("clickhouse", "url"));
    }
    Ok(())
}

fn validate_copy(config: &Config) -> Result<()> {
    let copy = &config.copy;

    if copy.table.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ConfigError::invalid_value("copy", "table", "must not be blank"));
    }
    if copy.batch_size == 0 {
        return Err(ConfigError::invalid_value("copy", "batch_size", "must be positive"));
    }
    if copy.max_parallelism == 0 {
        return Err(ConfigError::invalid_value(
            "copy",
            "max_parallelism",
            "must be positive",
        ));
    }
    if copy.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::invalid_value(
            "copy",
            "batch_size",
            format!("must not exceed {MAX_BATCH_SIZE}"),
        ));
    }
    if copy.max_parallelism > MAX_PARALLELISM {
        return Err(ConfigError::invalid_value(
            "copy",
            "max_parallelism",
            format!("must not exceed {MAX_PARALLELISM}"),
        ));
    }

    let mut seen = HashSet::new();
    for (i, column) in copy.columns.iter().enumerate() {
        if column.name.is_empty() {
            return Err(ConfigError::invalid_value(
                "copy",
                format!("columns[{i}].name"),
                "must not be empty",
            ));
        }
        if column.type_declaration.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "copy",
                format!("columns[{i}].type"),
                format!("column '{}' has no type", column.name),
            ));
        }
        if !seen.insert(column.name.as_str()) {
            return Err(ConfigError::invalid_value(
                "copy",
                format!("columns[{i}].name"),
                format!("duplicate column '{}'", column.name),
            ));
        }
    }

    Ok(())
}
