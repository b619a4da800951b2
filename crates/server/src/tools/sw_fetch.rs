//! sw_fetch tool implementation.
//!
//! Runs a request through the proxy exactly as an intercepted page request
//! would be. Requests the filter rejects are performed directly on the
//! network without touching the cache.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::{
    CacheProxy, Destination, Error, FetchOutcome, InterceptedRequest, LifecycleHandler, Network, RequestMode, Response,
    ResponseSource,
};
use url::Url;

use super::json_result;
use crate::error::ServerError;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL to request
    pub url: String,

    /// HTTP method (default: "GET")
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode; "navigate" selects network-first (default: "no-cors")
    #[serde(default)]
    pub mode: RequestMode,

    /// Request destination, e.g. "image" (default: "")
    #[serde(default)]
    pub destination: Destination,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Where the tool's response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FetchSource {
    Network,
    Cache,
    FallbackImage,
    Offline,
    /// Not eligible for caching; fetched directly.
    Passthrough,
}

impl From<ResponseSource> for FetchSource {
    fn from(source: ResponseSource) -> Self {
        match source {
            ResponseSource::Network => FetchSource::Network,
            ResponseSource::Cache => FetchSource::Cache,
            ResponseSource::FallbackImage => FetchSource::FallbackImage,
            ResponseSource::Offline => FetchSource::Offline,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    pub source: FetchSource,

    /// Why the request bypassed the cache, for passthrough responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass_reason: Option<String>,

    pub headers: Vec<HeaderPair>,

    /// Body decoded as UTF-8, lossy
    pub body: String,
    pub body_bytes: usize,
}

impl SwFetchOutput {
    pub(crate) fn new(request: &InterceptedRequest, response: Response, source: FetchSource) -> Self {
        let url = response.url.clone().unwrap_or_else(|| request.url.to_string());
        let headers = response
            .headers
            .iter()
            .map(|(name, value)| HeaderPair { name: name.clone(), value: value.clone() })
            .collect();

        Self {
            url,
            status: response.status,
            source,
            bypass_reason: None,
            headers,
            body: response.text(),
            body_bytes: response.body.len(),
        }
    }
}

/// Execute the sw_fetch tool.
pub async fn fetch_impl(
    proxy: &CacheProxy, network: &dyn Network, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ServerError::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(ServerError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = Url::parse(params.url.trim()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = InterceptedRequest::get(url)
        .with_method(params.method.trim())
        .with_mode(params.mode)
        .with_destination(params.destination);

    let output = match proxy.on_fetch(request.clone()).await {
        FetchOutcome::Respond { response, source } => SwFetchOutput::new(&request, response, source.into()),
        FetchOutcome::Passthrough(reason) => {
            tracing::debug!(url = %request.url, %reason, "passthrough");
            let response = network.fetch(&request).await.map_err(Error::from)?;
            let output = SwFetchOutput::new(&request, response, FetchSource::Passthrough);
            SwFetchOutput { bypass_reason: Some(reason.to_string()), ..output }
        }
        FetchOutcome::Unresolved => return Err(Error::NoResponse(request.url.to_string()).into()),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::test_support::{ORIGIN, StubNetwork, output, proxy, site};

    fn params(path: &str) -> SwFetchParams {
        SwFetchParams {
            url: format!("{ORIGIN}{path}"),
            method: default_method(),
            mode: RequestMode::default(),
            destination: Destination::default(),
        }
    }

    #[test]
    fn test_params_defaults() {
        let params: SwFetchParams = serde_json::from_str(r#"{"url": "http://localhost:5001/"}"#).unwrap();
        assert_eq!(params.method, "GET");
        assert_eq!(params.mode, RequestMode::NoCors);
        assert_eq!(params.destination, Destination::Empty);
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let network = Arc::new(site(&[]));
        let (proxy, _) = proxy(network.clone());

        let result = fetch_impl(&proxy, network.as_ref(), SwFetchParams { url: "  ".into(), ..params("/") }).await;
        assert_eq!(result.unwrap_err().code.0, -32602);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let network = Arc::new(site(&[]));
        let (proxy, _) = proxy(network.clone());

        let result = fetch_impl(&proxy, network.as_ref(), SwFetchParams { url: "not a url".into(), ..params("/") }).await;
        assert_eq!(result.unwrap_err().code.0, -32003);
    }

    #[tokio::test]
    async fn test_fetch_cache_first_after_network() {
        let network = Arc::new(site(&[("/api/programs", Response::new(200, "[1,2]"))]));
        let (proxy, _) = proxy(network.clone());

        let first: SwFetchOutput = output(&fetch_impl(&proxy, network.as_ref(), params("/api/programs")).await.unwrap());
        assert_eq!(first.source, FetchSource::Network);
        assert_eq!(first.body, "[1,2]");

        proxy.flush_writes().await;
        network.set_offline(true);

        let second: SwFetchOutput = output(&fetch_impl(&proxy, network.as_ref(), params("/api/programs")).await.unwrap());
        assert_eq!(second.source, FetchSource::Cache);
        assert_eq!(second.body, "[1,2]");
    }

    #[tokio::test]
    async fn test_fetch_offline_resource() {
        let network = Arc::new(site(&[]));
        network.set_offline(true);
        let (proxy, _) = proxy(network.clone());

        let out: SwFetchOutput = output(&fetch_impl(&proxy, network.as_ref(), params("/api/missing")).await.unwrap());

        assert_eq!(out.source, FetchSource::Offline);
        assert_eq!(out.status, 503);
        assert_eq!(out.body, "Network error");
        assert!(out.headers.iter().any(|h| h.name == "content-type" && h.value.starts_with("text/plain")));
    }

    #[tokio::test]
    async fn test_fetch_navigation_unresolved() {
        let network = Arc::new(StubNetwork::default());
        let (proxy, _) = proxy(network.clone());

        let nav = SwFetchParams { mode: RequestMode::Navigate, destination: Destination::Document, ..params("/guide") };
        let err = fetch_impl(&proxy, network.as_ref(), nav).await.unwrap_err();

        assert_eq!(err.code.0, -32014);
    }

    #[tokio::test]
    async fn test_fetch_post_passes_through() {
        let network = Arc::new(site(&[("/api/vote", Response::new(201, "ok"))]));
        let (proxy, _) = proxy(network.clone());

        let post = SwFetchParams { method: "post".into(), ..params("/api/vote") };
        let out: SwFetchOutput = output(&fetch_impl(&proxy, network.as_ref(), post).await.unwrap());

        assert_eq!(out.source, FetchSource::Passthrough);
        assert_eq!(out.status, 201);
        assert!(out.bypass_reason.is_some());
        proxy.flush_writes().await;
        assert!(proxy.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_passthrough_network_failure() {
        let network = Arc::new(StubNetwork::default());
        let (proxy, _) = proxy(network.clone());

        let post = SwFetchParams { method: "DELETE".into(), ..params("/api/vote") };
        let err = fetch_impl(&proxy, network.as_ref(), post).await.unwrap_err();

        assert_eq!(err.code.0, -32008);
    }
}
