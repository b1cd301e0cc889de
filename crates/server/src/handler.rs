//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the fact cache.
use crate::tools::facts::{
    FactSetParams, HostParams, contains_impl, copy_impl, delete_impl, flush_impl, get_impl, keys_impl, set_impl,
    sweep_impl,
};

use factcache_core::FactCache;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for the fact cache.
#[derive(Clone)]
pub struct FactCacheServer {
    cache: FactCache,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl FactCacheServer {
    /// Create a new server handler around an opened cache.
    pub fn new(cache: FactCache) -> Self {
        Self { cache, tool_router: Self::tool_router() }
    }

    #[tool(description = "Get the cached facts for a host. Fails with a not-found error if none are cached.")]
    async fn fact_get(&self, params: Parameters<HostParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.cache, params.0).await
    }

    /// Store facts for a host.
    ///
    /// Replaces any facts already cached for the host and restarts its timeout.
    #[tool(description = "Store facts for a host, replacing any cached facts. Optional timeout in seconds (0 = never expires).")]
    async fn fact_set(&self, params: Parameters<FactSetParams>) -> Result<CallToolResult, McpError> {
        set_impl(&self.cache, params.0).await
    }

    #[tool(description = "Check whether facts are cached for a host.")]
    async fn fact_contains(&self, params: Parameters<HostParams>) -> Result<CallToolResult, McpError> {
        contains_impl(&self.cache, params.0).await
    }

    #[tool(description = "Delete the cached facts for a host. Reports whether an entry was removed.")]
    async fn fact_delete(&self, params: Parameters<HostParams>) -> Result<CallToolResult, McpError> {
        delete_impl(&self.cache, params.0).await
    }

    #[tool(description = "List every host with cached facts.")]
    async fn fact_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.cache).await
    }

    #[tool(description = "Return all cached facts keyed by host.")]
    async fn fact_copy(&self) -> Result<CallToolResult, McpError> {
        copy_impl(&self.cache).await
    }

    #[tool(description = "Delete all cached facts.")]
    async fn fact_flush(&self) -> Result<CallToolResult, McpError> {
        flush_impl(&self.cache).await
    }

    /// Remove expired entries.
    ///
    /// The cache only sweeps when it opens; this lets a long-running server drop stale facts on demand.
    #[tool(description = "Delete cached facts whose timeout has elapsed. Returns the number removed.")]
    async fn fact_sweep(&self) -> Result<CallToolResult, McpError> {
        sweep_impl(&self.cache).await
    }
}

impl ServerHandler for FactCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "fact-cache-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_router_lists_fact_tools() {
        let cache = FactCache::open_in_memory().await.unwrap();
        let server = FactCacheServer::new(cache);

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "fact_contains",
                "fact_copy",
                "fact_delete",
                "fact_flush",
                "fact_get",
                "fact_keys",
                "fact_set",
                "fact_sweep",
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let server = FactCacheServer::new(FactCache::open_in_memory().await.unwrap());
        let info = server.get_info();
        assert_eq!(info.server_info.name, "fact-cache-mcp");
        assert!(info.capabilities.tools.is_some());
    }
}
