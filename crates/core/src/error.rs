//! Unified error types for the fact cache.
//!
//! Each variant carries a stable code prefix so operators can grep logs and
//! tool responses for the failure class.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

use crate::config::ConfigError;

/// Unified error types for the fact cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Backing table missing, invalid configuration, or no connection could be opened.
    #[error("CONFIGURATION_ERROR: {0}")]
    Configuration(String),

    /// No facts stored for the given host (or the stored facts are null).
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Facts could not be encoded as JSON, or do not fit the requested type.
    #[error("SERIALIZATION_ERROR: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("BACKEND_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Backend failure outside of SQLite itself (pool exhausted, undecodable stored facts).
    #[error("BACKEND_ERROR: {0}")]
    Backend(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl Error {
    /// Whether this error means "no such host" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::NotFound(host) => (-32001, format!("no facts cached for host {host}")),
            Error::Database(e) => (-32002, e.to_string()),
            Error::Backend(msg) => (-32002, msg.clone()),
            Error::Configuration(msg) => (-32003, msg.clone()),
            Error::Serialization(e) => (-32602, e.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
