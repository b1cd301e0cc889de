//! Fact cache MCP tools.
//!
//! This module provides tools for reading and writing host facts in the
//! SQLite fact cache.

use factcache_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

pub mod delete;
pub mod get;
pub mod list;
pub mod purge;
pub mod set;

pub use delete::delete_impl;
pub use get::{contains_impl, get_impl};
pub use list::{copy_impl, keys_impl};
pub use purge::{flush_impl, sweep_impl};
pub use set::{FactSetParams, set_impl};

/// Parameters for tools addressing a single host.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HostParams {
    /// Inventory hostname whose facts are addressed.
    pub host: String,
}

pub(crate) fn require_host(host: &str) -> Result<(), ToolError> {
    if host.trim().is_empty() {
        return Err(ToolError::InvalidInput("host cannot be empty".into()));
    }
    Ok(())
}

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(Error::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) fn output_json(result: &CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
