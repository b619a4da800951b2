//! HTTP network backend for the caching proxy.
//!
//! ### Behavior
//! - Issues the intercepted request with its own method
//! - Returns every HTTP status as a response; only transport failures
//!   (connect, timeout, oversized body) are errors
//! - Max redirects: 5 (configurable)
//! - Max body bytes: 5MB (configurable), enforced while the body streams

use std::time::{Duration, Instant};

use reqwest::{Client, Method, header};
use swproxy_core::{AppConfig, Error, InterceptedRequest, Network, NetworkError, RequestMode, Response};

const NAVIGATION_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swproxy/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "swproxy/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        }
    }
}

/// reqwest-backed [`Network`].
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn map_send_error(&self, err: reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            NetworkError::Timeout(format!("{}ms", self.config.timeout.as_millis()))
        } else if err.is_builder() {
            NetworkError::InvalidRequest(err.to_string())
        } else {
            NetworkError::Connect(err.to_string())
        }
    }

    fn too_large(&self, len: usize) -> NetworkError {
        NetworkError::TooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes))
    }
}

#[async_trait::async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, NetworkError> {
        let start = Instant::now();
        let method =
            Method::from_bytes(request.method.as_bytes()).map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;

        let mut builder = self.http.request(method, request.url.clone());
        if request.mode == RequestMode::Navigate {
            builder = builder.header(header::ACCEPT, NAVIGATION_ACCEPT);
        }

        let mut response = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(self.too_large(len as usize));
        }

        let final_url = response.url().to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let hint = response.content_length().unwrap_or(0) as usize;
        let mut body = Vec::with_capacity(hint.min(self.config.max_bytes));
        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_send_error(e))? {
            if body.len() + chunk.len() > self.config.max_bytes {
                return Err(self.too_large(body.len() + chunk.len()));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response { url: Some(final_url), status: status.as_u16(), headers, body: body.into() })
    }
}
