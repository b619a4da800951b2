//! MCP tool implementations.
//!
//! Lifecycle tools stand in for the events a browser would deliver; cache
//! tools inspect the current generation.

pub mod cache;
pub mod lifecycle;
pub mod sw_fetch;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ServerError;

pub use lifecycle::start;

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ServerError::Serialize(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
