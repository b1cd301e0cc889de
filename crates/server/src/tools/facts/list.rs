//! fact_keys and fact_copy tool implementations.
//!
//! Both report every stored row, including rows whose timeout has passed
//! since the last sweep.

use std::collections::BTreeMap;

use factcache_core::FactCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::json_result;

/// Output from the fact_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FactKeysOutput {
    /// Cached hosts in ascending order.
    pub hosts: Vec<String>,
    pub count: usize,
}

/// Output from the fact_copy tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FactCopyOutput {
    /// Facts keyed by host.
    pub facts: BTreeMap<String, Value>,
}

/// Implementation of the fact_keys tool.
pub async fn keys_impl(cache: &FactCache) -> Result<CallToolResult, McpError> {
    let hosts = cache.keys().await?;
    let count = hosts.len();
    json_result(&FactKeysOutput { hosts, count })
}

/// Implementation of the fact_copy tool.
pub async fn copy_impl(cache: &FactCache) -> Result<CallToolResult, McpError> {
    let facts = cache.copy().await?;
    json_result(&FactCopyOutput { facts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::facts::output_json;
    use serde_json::json;

    #[tokio::test]
    async fn test_keys_impl() {
        let cache = FactCache::open_in_memory().await.unwrap();
        cache.set("web02", &json!({})).await.unwrap();
        cache.set("web01", &json!({})).await.unwrap();

        let output: FactKeysOutput = serde_json::from_value(output_json(&keys_impl(&cache).await.unwrap())).unwrap();
        assert_eq!(output.hosts, vec!["web01", "web02"]);
        assert_eq!(output.count, 2);
    }

    #[tokio::test]
    async fn test_copy_impl() {
        let cache = FactCache::open_in_memory().await.unwrap();
        cache.set("web01", &json!({"os": "linux"})).await.unwrap();
        cache.set("db01", &json!({"os": "bsd"})).await.unwrap();

        let output: FactCopyOutput = serde_json::from_value(output_json(&copy_impl(&cache).await.unwrap())).unwrap();
        assert_eq!(output.facts.len(), 2);
        assert_eq!(output.facts["db01"], json!({"os": "bsd"}));
    }
}
