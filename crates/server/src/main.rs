//! swproxy server entry point.
//!
//! Boots the caching proxy, runs install and activate for the configured
//! generation, then serves MCP tools on stdio. Logging goes to stderr to
//! avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swproxy_client::{FetchConfig, HttpNetwork};
use swproxy_core::{AppConfig, CacheDb, CacheProxy, CacheStorage, MemoryStorage, Network, StorageKind};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

/// How long pending cache writes may run after the transport closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    let storage: Arc<dyn CacheStorage> = match config.storage {
        StorageKind::Sqlite => Arc::new(CacheDb::open(&config.db_path).await?),
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
    };
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(FetchConfig::from(&config))?);
    let proxy = if config.auto_install {
        tools::start(&config, storage, network.clone()).await?
    } else {
        CacheProxy::new(&config, storage, network.clone())?
    };

    tracing::info!(generation = %proxy.generation(), origin = %config.origin, "starting swproxy on stdio transport");

    let handler = handler::SwProxyServer::new(proxy.clone(), network);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    let abandoned = proxy.shutdown_writes(SHUTDOWN_GRACE).await;
    tracing::info!(abandoned, "swproxy stopped");

    Ok(())
}
