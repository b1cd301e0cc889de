//! fact-cache-mcp server entry point.
//!
//! Loads configuration, opens the fact cache (verifying its table and
//! sweeping expired entries), and serves the cache tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use factcache_core::{AppConfig, FactCache};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        connection = %config.connection,
        table = %config.table,
        timeout = config.timeout,
        "Starting fact-cache-mcp server on stdio transport"
    );

    let cache = FactCache::open(&config).await?;
    let handler = handler::FactCacheServer::new(cache);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
