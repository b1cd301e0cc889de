//! fact_get and fact_contains tool implementations.
//!
//! Looks up cached facts for a host.

use factcache_core::FactCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{HostParams, json_result, require_host};

/// Output from the fact_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FactGetOutput {
    pub host: String,
    /// The cached facts.
    pub facts: Value,
}

/// Output from the fact_contains tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FactContainsOutput {
    pub host: String,
    /// Whether a row exists for the host, expired or not.
    pub present: bool,
}

/// Implementation of the fact_get tool.
pub async fn get_impl(cache: &FactCache, params: HostParams) -> Result<CallToolResult, McpError> {
    require_host(&params.host)?;
    let facts = cache.get(&params.host).await?;
    json_result(&FactGetOutput { host: params.host, facts })
}

/// Implementation of the fact_contains tool.
pub async fn contains_impl(cache: &FactCache, params: HostParams) -> Result<CallToolResult, McpError> {
    require_host(&params.host)?;
    let present = cache.contains(&params.host).await?;
    json_result(&FactContainsOutput { host: params.host, present })
}
