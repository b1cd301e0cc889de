//! fact_flush and fact_sweep tool implementations.
//!
//! Removes cache entries, either all of them or only expired ones.

use factcache_core::FactCache;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output from the purge tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FactPurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the fact_flush tool.
pub async fn flush_impl(cache: &FactCache) -> Result<CallToolResult, McpError> {
    let deleted = cache.flush().await?;
    json_result(&FactPurgeOutput { deleted })
}

/// Implementation of the fact_sweep tool.
pub async fn sweep_impl(cache: &FactCache) -> Result<CallToolResult, McpError> {
    let deleted = cache.sweep_expired().await?;
    json_result(&FactPurgeOutput { deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::facts::output_json;
    use chrono::{Duration, Utc};
    use factcache_core::{AppConfig, ManualClock};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_flush_impl() {
        let cache = FactCache::open_in_memory().await.unwrap();
        cache.set("web01", &json!({})).await.unwrap();
        cache.set("web02", &json!({})).await.unwrap();

        let output: FactPurgeOutput = serde_json::from_value(output_json(&flush_impl(&cache).await.unwrap())).unwrap();
        assert_eq!(output.deleted, 2);
        assert!(cache.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_impl() {
        let clock = ManualClock::new(Utc::now());
        let config = AppConfig { timeout: 10, ..AppConfig::in_memory() };
        let cache = FactCache::with_clock(&config, Arc::new(clock.clone())).await.unwrap();
        cache.set("web01", &json!({})).await.unwrap();
        cache.set_with_timeout("web02", &json!({}), 0).await.unwrap();

        clock.advance(Duration::seconds(11));

        let output: FactPurgeOutput = serde_json::from_value(output_json(&sweep_impl(&cache).await.unwrap())).unwrap();
        assert_eq!(output.deleted, 1);
        assert_eq!(cache.keys().await.unwrap(), vec!["web02"]);
    }
}
