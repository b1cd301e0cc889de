//! fact_set tool implementation.
//!
//! Stores facts for a host, replacing anything cached before.

use factcache_core::FactCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{json_result, require_host};

/// Parameters for the fact_set tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FactSetParams {
    /// Inventory hostname the facts belong to.
    pub host: String,

    /// The fact document to cache.
    pub facts: Value,

    /// Seconds until the entry expires (0 = never). Defaults to the server's configured timeout.
    #[serde(default)]
    pub timeout: Option<u32>,
}

/// Output from the fact_set tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FactSetOutput {
    pub host: String,
    /// Timeout applied to the stored entry, in seconds.
    pub timeout: u32,
}

/// Implementation of the fact_set tool.
pub async fn set_impl(cache: &FactCache, params: FactSetParams) -> Result<CallToolResult, McpError> {
    require_host(&params.host)?;

    let timeout = params.timeout.unwrap_or_else(|| cache.default_timeout());
    cache.set_with_timeout(&params.host, &params.facts, timeout).await?;

    json_result(&FactSetOutput { host: params.host, timeout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::facts::output_json;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_impl_uses_default_timeout() {
        let cache = FactCache::open_in_memory().await.unwrap();
        let params = FactSetParams { host: "web01".into(), facts: json!({"os": "linux"}), timeout: None };

        let result = set_impl(&cache, params).await.unwrap();
        assert_eq!(output_json(&result)["timeout"], 86_400);
        assert_eq!(cache.get("web01").await.unwrap(), json!({"os": "linux"}));
    }

    #[tokio::test]
    async fn test_set_impl_timeout_override() {
        let cache = FactCache::open_in_memory().await.unwrap();
        let params = FactSetParams { host: "web01".into(), facts: json!({"os": "linux"}), timeout: Some(0) };

        set_impl(&cache, params).await.unwrap();
        assert_eq!(cache.entry("web01").await.unwrap().unwrap().timeout, 0);
    }

    #[tokio::test]
    async fn test_set_impl_empty_host() {
        let cache = FactCache::open_in_memory().await.unwrap();
        let params = FactSetParams { host: " ".into(), facts: json!({}), timeout: None };

        let err = set_impl(&cache, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert!(cache.keys().await.unwrap().is_empty());
    }
}
