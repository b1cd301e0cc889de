//! fact_delete tool implementation.

use factcache_core::FactCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{HostParams, json_result, require_host};

/// Output from the fact_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FactDeleteOutput {
    pub host: String,
    /// Whether a cached entry was removed.
    pub deleted: bool,
}

/// Implementation of the fact_delete tool.
pub async fn delete_impl(cache: &FactCache, params: HostParams) -> Result<CallToolResult, McpError> {
    require_host(&params.host)?;
    let deleted = cache.delete(&params.host).await?;
    json_result(&FactDeleteOutput { host: params.host, deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::facts::output_json;
    use serde_json::json;

    #[tokio::test]
    async fn test_delete_impl() {
        let cache = FactCache::open_in_memory().await.unwrap();
        cache.set("web01", &json!({"os": "linux"})).await.unwrap();

        let result = delete_impl(&cache, HostParams { host: "web01".into() }).await.unwrap();
        assert_eq!(output_json(&result)["deleted"], true);

        let result = delete_impl(&cache, HostParams { host: "web01".into() }).await.unwrap();
        assert_eq!(output_json(&result)["deleted"], false);
    }
}
