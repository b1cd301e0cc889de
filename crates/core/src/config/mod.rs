//! Fact cache configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FACT_CACHE_*)
//! 2. TOML config file (if FACT_CACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::PoolConfig;

mod validation;

pub use validation::ConfigError;
pub(crate) use validation::is_valid_table_name;

/// Connection target that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Fact cache configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FACT_CACHE_*)
/// 2. TOML config file (if FACT_CACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database path, or `:memory:`.
    ///
    /// Set via FACT_CACHE_CONNECTION environment variable.
    #[serde(default = "default_connection")]
    pub connection: String,

    /// Seconds a stored entry stays valid; 0 means it never expires.
    ///
    /// Set via FACT_CACHE_TIMEOUT environment variable.
    #[serde(default = "default_timeout")]
    pub timeout: u32,

    /// Name of the backing table.
    ///
    /// Set via FACT_CACHE_TABLE environment variable.
    #[serde(default = "default_table")]
    pub table: String,

    /// Connections opened eagerly when the pool starts.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Upper bound on live connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long an operation waits for a free connection, in milliseconds.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// How long SQLite waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Create the backing table when it is missing instead of failing.
    ///
    /// Set via FACT_CACHE_CREATE_TABLE environment variable.
    #[serde(default)]
    pub create_table: bool,
}

fn default_connection() -> String {
    "./ansible-facts.sqlite".into()
}

fn default_timeout() -> u32 {
    86_400 // 24h
}

fn default_table() -> String {
    "ansible_fact_cache".into()
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    2
}

fn default_acquire_timeout_ms() -> u64 {
    5_000
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connection: default_connection(),
            timeout: default_timeout(),
            table: default_table(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            create_table: false,
        }
    }
}

impl AppConfig {
    /// Configuration for a single-connection in-memory cache that creates its table.
    pub fn in_memory() -> Self {
        Self {
            connection: IN_MEMORY.into(),
            min_connections: 1,
            max_connections: 1,
            create_table: true,
            ..Default::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.connection == IN_MEMORY
    }

    /// Pool settings derived from this configuration.
    pub fn pool(&self) -> PoolConfig {
        PoolConfig {
            target: self.connection.clone(),
            min_connections: self.min_connections,
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FACT_CACHE_`
    /// 2. TOML file from `FACT_CACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FACT_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        Self::extract(figment.merge(Env::prefixed("FACT_CACHE_").ignore(&["config_file"])))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.connection, "./ansible-facts.sqlite");
        assert_eq!(config.timeout, 86_400);
        assert_eq!(config.table, "ansible_fact_cache");
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_connections, 2);
        assert!(!config.create_table);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_in_memory_config() {
        let config = AppConfig::in_memory();
        assert!(config.is_in_memory());
        assert_eq!(config.max_connections, 1);
        assert!(config.create_table);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_config() {
        let pool = AppConfig::default().pool();
        assert_eq!(pool.target, "./ansible-facts.sqlite");
        assert_eq!(pool.max_connections, 2);
        assert_eq!(pool.acquire_timeout, Duration::from_millis(5_000));
        assert_eq!(pool.busy_timeout, Duration::from_millis(5_000));
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string("timeout = 600\ntable = \"facts\"\ncreate_table = true"));

        let config = AppConfig::extract(figment).unwrap();
        assert_eq!(config.timeout, 600);
        assert_eq!(config.table, "facts");
        assert!(config.create_table);
        assert_eq!(config.max_connections, 2);
    }

    #[test]
    fn test_extract_runs_validation() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string("table = \"\""));

        let result = AppConfig::extract(figment);
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "table"));
    }
}
