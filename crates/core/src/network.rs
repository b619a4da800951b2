//! Network interface consumed by the fetch strategies and the bootstrapper.

use crate::{InterceptedRequest, Response};

/// Failure to obtain any response from the network.
///
/// A response with an error status is not a `NetworkError`; it is returned
/// as a normal [`Response`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// Could not connect or the connection dropped mid-request.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Request timed out.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Response body exceeded the configured limit.
    #[error("response too large: {0}")]
    TooLarge(String),

    /// The request could not be issued (bad method, unsupported scheme).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Network fetcher.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Issue the request and return whatever response arrives.
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, NetworkError>;
}
