//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

const MAX_CONNECTIONS_LIMIT: u32 = 32;
const MAX_TABLE_NAME_LEN: usize = 63;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

/// Whether `name` can be spliced into SQL as a quoted identifier.
pub(crate) fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    name.len() <= MAX_TABLE_NAME_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `connection` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `table` is not a plain SQL identifier
    /// - pool bounds are outside `1 <= min <= max <= 32`
    /// - an in-memory target is combined with more than one connection
    /// - `acquire_timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `busy_timeout_ms` exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "connection".into(),
                hint: "Set FACT_CACHE_CONNECTION to a database path, e.g. /var/cache/ansible/facts.sqlite".into(),
            });
        }

        if self.table.is_empty() {
            return Err(ConfigError::Invalid { field: "table".into(), reason: "must not be empty".into() });
        }
        if !is_valid_table_name(&self.table) {
            return Err(ConfigError::Invalid {
                field: "table".into(),
                reason: "must start with a letter or underscore and contain only [A-Za-z0-9_] (max 63 chars)".into(),
            });
        }

        if self.min_connections == 0 {
            return Err(ConfigError::Invalid {
                field: "min_connections".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.max_connections < self.min_connections {
            return Err(ConfigError::Invalid {
                field: "max_connections".into(),
                reason: format!("must be at least min_connections ({})", self.min_connections),
            });
        }
        if self.max_connections > MAX_CONNECTIONS_LIMIT {
            return Err(ConfigError::Invalid {
                field: "max_connections".into(),
                reason: format!("must not exceed {MAX_CONNECTIONS_LIMIT}"),
            });
        }
        if self.is_in_memory() && self.max_connections != 1 {
            return Err(ConfigError::Invalid {
                field: "max_connections".into(),
                reason: "an in-memory database is private to one connection; use 1".into(),
            });
        }

        if self.acquire_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "acquire_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.acquire_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "acquire_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.busy_timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "busy_timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.timeout == 0 {
            tracing::warn!(table = %self.table, "timeout is 0; cached facts will never expire");
        }

        Ok(())
    }
}
