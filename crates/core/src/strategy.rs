//! Per-request fetch strategies.
//!
//! Navigations are network-first: a live response wins and refreshes the
//! cache, the cached copy is the fallback. Everything else is cache-first
//! with no freshness check; a miss goes to the network, and a network
//! failure is answered with the fallback icon (images) or a synthetic
//! offline response.
//!
//! A 200 from the network is cloned and the clone is written in the
//! background through the [`WriteQueue`]. The original goes straight back
//! to the caller.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::filter::{self, Rejection};
use crate::{AppConfig, CacheStorage, Destination, Error, InterceptedRequest, Network, RequestKey, Response, WriteQueue};

/// Where the returned response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Network,
    Cache,
    FallbackImage,
    Offline,
}

/// Result of handling one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The filter rejected the request; the host should perform it untouched.
    Passthrough(Rejection),
    Respond { response: Response, source: ResponseSource },
    /// Navigation failed and nothing was cached. Surfaces as a failed load.
    Unresolved,
}

impl FetchOutcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Respond { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Respond { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// Strategy selected for an eligible request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
}

impl Strategy {
    pub fn for_request(request: &InterceptedRequest) -> Self {
        if request.is_navigation() { Strategy::NetworkFirst } else { Strategy::CacheFirst }
    }
}

/// Runs the strategies against one cache generation.
#[derive(Clone)]
pub struct FetchStrategy {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    generation: String,
    fallback_image: RequestKey,
    offline_status: u16,
    offline_body: String,
    writes: WriteQueue,
}

impl FetchStrategy {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let fallback_image = RequestKey::get(&config.resolve(&config.fallback_image)?);
        Ok(Self {
            storage,
            network,
            generation: config.cache_name.clone(),
            fallback_image,
            offline_status: config.offline_status,
            offline_body: config.offline_body.clone(),
            writes: WriteQueue::new(),
        })
    }

    pub fn writes(&self) -> &WriteQueue {
        &self.writes
    }

    /// Filter the request, then run the strategy its mode calls for.
    pub async fn handle(&self, request: &InterceptedRequest) -> FetchOutcome {
        if let Err(rejection) = filter::check(request) {
            tracing::debug!(url = %request.url, reason = %rejection, "not intercepted");
            return FetchOutcome::Passthrough(rejection);
        }

        match Strategy::for_request(request) {
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: &InterceptedRequest) -> FetchOutcome {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_if_cacheable(request, &response);
                FetchOutcome::Respond { response, source: ResponseSource::Network }
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "navigation failed, trying cache");
                match self.lookup(&request.key()).await {
                    Some(response) => FetchOutcome::Respond { response, source: ResponseSource::Cache },
                    None => FetchOutcome::Unresolved,
                }
            }
        }
    }

    async fn cache_first(&self, request: &InterceptedRequest) -> FetchOutcome {
        if let Some(response) = self.lookup(&request.key()).await {
            tracing::debug!(url = %request.url, "cache hit");
            return FetchOutcome::Respond { response, source: ResponseSource::Cache };
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_if_cacheable(request, &response);
                FetchOutcome::Respond { response, source: ResponseSource::Network }
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "resource fetch failed");
                if request.destination == Destination::Image
                    && let Some(icon) = self.lookup(&self.fallback_image).await
                {
                    return FetchOutcome::Respond { response: icon, source: ResponseSource::FallbackImage };
                }
                FetchOutcome::Respond {
                    response: Response::offline(self.offline_status, &self.offline_body),
                    source: ResponseSource::Offline,
                }
            }
        }
    }

    fn store_if_cacheable(&self, request: &InterceptedRequest, response: &Response) {
        if response.is_cacheable() {
            self.writes
                .spawn_put(self.storage.clone(), self.generation.clone(), request.key(), response.clone());
        }
    }

    /// Current-generation lookup. A storage error counts as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<Response> {
        match self.storage.match_request(&self.generation, key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(url = %key.url, error = %e, "cache read failed");
                None
            }
        }
    }
}
