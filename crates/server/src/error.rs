//! Structured errors for the swproxy server.
//!
//! Tool-level failures that do not originate in the proxy core.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the swproxy server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid tool parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Tool output could not be serialized.
    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(String),
}

impl From<ServerError> for McpError {
    fn from(err: ServerError) -> Self {
        let (code, message) = match &err {
            ServerError::InvalidInput(msg) => (-32602, msg.clone()),
            ServerError::Serialize(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_code() {
        let err: McpError = ServerError::InvalidInput("url cannot be empty".into()).into();
        assert_eq!(err.code.0, -32602);
        assert_eq!(err.message, "url cannot be empty");
    }
}
