//! cache_keys tool implementation.
//!
//! Lists every generation and the entries of the current one.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::{CacheEntry, CacheProxy};

use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub current: String,
    /// All generation names, oldest first.
    pub generations: Vec<String>,
    pub entries: Vec<CacheEntry>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(proxy: &CacheProxy) -> Result<CallToolResult, McpError> {
    let output = CacheKeysOutput {
        current: proxy.generation().to_string(),
        generations: proxy.generations().await?,
        entries: proxy.entries().await?,
    };

    json_result(&output)
}
