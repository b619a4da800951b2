//! Lifecycle wiring.
//!
//! [`CacheProxy`] composes the bootstrapper, the reaper, and the fetch
//! strategy behind the three named handlers of [`LifecycleHandler`]. A host
//! feeds it [`Event`]s through [`dispatch`].

use std::sync::Arc;
use std::time::Duration;

use crate::lifecycle::{ActivateReport, Bootstrapper, GenerationReaper, InstallReport};
use crate::strategy::{FetchOutcome, FetchStrategy};
use crate::{AppConfig, CacheEntry, CacheStorage, Error, InterceptedRequest, Network, RequestKey, Response};

/// Lifecycle events delivered by the host.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(InterceptedRequest),
}

/// Result of a dispatched event.
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched(FetchOutcome),
}

/// Handlers a host registers for the lifecycle events.
#[async_trait::async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// Populate the new generation. Failure means the version must not activate.
    async fn on_install(&self) -> Result<InstallReport, Error>;

    /// Remove superseded generations.
    async fn on_activate(&self) -> Result<ActivateReport, Error>;

    /// Answer an intercepted request. Never fails; see [`FetchOutcome`].
    async fn on_fetch(&self, request: InterceptedRequest) -> FetchOutcome;
}

/// Route an event to its handler.
pub async fn dispatch(handler: &dyn LifecycleHandler, event: Event) -> Result<EventOutcome, Error> {
    match event {
        Event::Install => handler.on_install().await.map(EventOutcome::Installed),
        Event::Activate => handler.on_activate().await.map(EventOutcome::Activated),
        Event::Fetch(request) => Ok(EventOutcome::Fetched(handler.on_fetch(request).await)),
    }
}

/// The caching proxy.
#[derive(Clone)]
pub struct CacheProxy {
    storage: Arc<dyn CacheStorage>,
    generation: String,
    bootstrapper: Bootstrapper,
    reaper: GenerationReaper,
    strategy: FetchStrategy,
}

impl CacheProxy {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        Ok(Self {
            generation: config.cache_name.clone(),
            bootstrapper: Bootstrapper::new(config, storage.clone(), network.clone())?,
            reaper: GenerationReaper::new(config, storage.clone()),
            strategy: FetchStrategy::new(config, storage.clone(), network)?,
            storage,
        })
    }

    /// Name of the current generation.
    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Current-generation lookup, bypassing the strategies.
    pub async fn cached(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.storage.match_request(&self.generation, key).await
    }

    /// Entries of the current generation.
    pub async fn entries(&self) -> Result<Vec<CacheEntry>, Error> {
        self.storage.entries(&self.generation).await
    }

    /// All generation names known to storage.
    pub async fn generations(&self) -> Result<Vec<String>, Error> {
        self.storage.keys().await
    }

    /// Wait for background cache writes started so far.
    pub async fn flush_writes(&self) {
        self.strategy.writes().flush().await;
    }

    /// Drain background writes, abandoning any still running after `grace`.
    pub async fn shutdown_writes(&self, grace: Duration) -> usize {
        self.strategy.writes().shutdown(grace).await
    }

    /// The generation storage last recorded as activated.
    pub async fn activated(&self) -> Result<Option<String>, Error> {
        self.storage.activated().await
    }
}

#[async_trait::async_trait]
impl LifecycleHandler for CacheProxy {
    async fn on_install(&self) -> Result<InstallReport, Error> {
        self.bootstrapper.install().await
    }

    async fn on_activate(&self) -> Result<ActivateReport, Error> {
        self.reaper.activate().await
    }

    async fn on_fetch(&self, request: InterceptedRequest) -> FetchOutcome {
        self.strategy.handle(&request).await
    }
}
