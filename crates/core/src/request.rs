//! Intercepted requests and their cache identity.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::hash::compute_cache_key;

/// How the host issued the request. Only `Navigate` changes strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Full document load.
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

/// What the requester intends to do with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    #[serde(rename = "")]
    Empty,
    Audio,
    Document,
    Font,
    Image,
    Manifest,
    Script,
    Style,
    Video,
    Worker,
}

/// A single network attempt handed to the proxy by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    pub url: Url,
    pub method: String,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl InterceptedRequest {
    /// A plain `GET` sub-resource request.
    pub fn get(url: Url) -> Self {
        Self { url, method: "GET".into(), mode: RequestMode::default(), destination: Destination::default() }
    }

    /// A `GET` navigation for a full document.
    pub fn navigate(url: Url) -> Self {
        Self { url, method: "GET".into(), mode: RequestMode::Navigate, destination: Destination::Document }
    }

    /// Override the method. Methods are compared upper-cased.
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// URL scheme without the trailing colon.
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Cache identity: method plus URL with the fragment stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url: url.into() }
    }

    /// Shorthand for a `GET` key.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    /// SHA-256 hex digest used as the storage key.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}
