//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Longest accepted interval or TTL: one year.
const MAX_SECS: u64 = 365 * 24 * 60 * 60;

/// Longest accepted retention or undelete window.
const MAX_DAYS: u64 = 36_500;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u64 },
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
    #[error("bootstrap.administrators contains an empty account id")]
    EmptyAdministrator,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    let seconds = [
        ("cache.ttl_secs", config.cache.ttl_secs),
        ("cache.prune_interval_secs", config.cache.prune_interval_secs),
        ("usage.summary_interval_secs", config.usage.summary_interval_secs),
        ("gadgets.purge_interval_secs", config.gadgets.purge_interval_secs),
    ];
    for (field, value) in seconds {
        if value == 0 {
            errors.push(ValidationError::NotPositive(field));
        } else if value > MAX_SECS {
            errors.push(ValidationError::TooLarge { field, max: MAX_SECS });
        }
    }

    let days = [
        ("usage.metric_retention_days", config.usage.metric_retention_days),
        ("gadgets.undelete_window_days", config.gadgets.undelete_window_days),
    ];
    for (field, value) in days {
        if value <= 0 {
            errors.push(ValidationError::NotPositive(field));
        } else if value.unsigned_abs() > MAX_DAYS {
            errors.push(ValidationError::TooLarge { field, max: MAX_DAYS });
        }
    }

    if config.database.path != ":memory:" {
        let db_path = Path::new(&config.database.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(config.database.path.clone()));
        }
    }

    if config
        .bootstrap
        .administrators
        .iter()
        .any(|account| account.trim().is_empty())
    {
        errors.push(ValidationError::EmptyAdministrator);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
