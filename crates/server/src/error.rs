//! Structured errors for the fact cache tool server.
//!
//! Cache failures arrive as `factcache_core::Error`; this type covers
//! requests rejected before they reach the cache.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the fact cache tool server.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., empty host).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_code() {
        let err: McpError = ToolError::InvalidInput("host cannot be empty".into()).into();
        assert_eq!(err.code.0, -32602);
        assert_eq!(err.message, "host cannot be empty");
    }
}
