//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    cache::{CacheGetParams, get_impl, keys_impl},
    lifecycle::{activate_impl, install_impl},
    sw_fetch::{SwFetchParams, fetch_impl},
};

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
use swproxy_core::{CacheProxy, Network};

/// The main MCP server handler for swproxy.
#[derive(Clone)]
pub struct SwProxyServer {
    tool_router: ToolRouter<Self>,
    proxy: CacheProxy,
    network: Arc<dyn Network>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl SwProxyServer {
    /// Create a new server handler around a proxy and the network it uses.
    pub fn new(proxy: CacheProxy, network: Arc<dyn Network>) -> Self {
        Self { tool_router: Self::tool_router(), proxy, network }
    }

    #[tool(description = "Run the install event: fetch the app shell into the current cache generation. Fails without writing anything if any resource fails.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.proxy).await
    }

    #[tool(description = "Run the activate event: delete every cache generation except the current one.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.proxy).await
    }

    /// Fetch through the proxy.
    ///
    /// Navigations are network-first, other GETs cache-first. Requests that are
    /// not eligible for caching go straight to the network.
    #[tool(
        description = "Fetch a URL through the caching proxy. Use mode \"navigate\" for page loads and destination \"image\" for images. Returns status, headers, body, and where the response came from."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.proxy, self.network.as_ref(), params.0).await
    }

    #[tool(description = "List cache generations and the entries of the current generation.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.proxy).await
    }

    #[tool(description = "Read a cached GET response from the current generation by URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.proxy, params.0).await
    }
}

impl ServerHandler for SwProxyServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swproxy".into(),
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
    use crate::tools::test_support::{proxy, site};

    #[test]
    fn test_tools_registered() {
        let network = Arc::new(site(&[]));
        let (proxy, _) = proxy(network.clone());
        let server = SwProxyServer::new(proxy, network);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["cache_get", "cache_keys", "sw_activate", "sw_fetch", "sw_install"]);
    }

    #[test]
    fn test_server_info() {
        let network = Arc::new(site(&[]));
        let (proxy, _) = proxy(network.clone());
        let info = SwProxyServer::new(proxy, network).get_info();
        assert_eq!(info.server_info.name, "swproxy");
    }
}
