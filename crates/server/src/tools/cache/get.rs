//! cache_get tool implementation.
//!
//! Reads one entry of the current generation without going through a
//! fetch strategy.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::{CacheProxy, Error, InterceptedRequest, RequestKey};
use url::Url;

use crate::tools::json_result;
use crate::tools::sw_fetch::{FetchSource, SwFetchOutput};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL of the cached request.
    pub url: String,

    /// HTTP method of the cached request (default: "GET")
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Implementation of the cache_get tool.
pub async fn get_impl(proxy: &CacheProxy, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = Url::parse(params.url.trim()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = RequestKey::new(params.method.trim(), &url);

    let response = proxy
        .cached(&key)
        .await?
        .ok_or_else(|| Error::CacheMiss(key.url.clone()))?;

    json_result(&SwFetchOutput::new(&InterceptedRequest::get(url), response, FetchSource::Cache))
}
