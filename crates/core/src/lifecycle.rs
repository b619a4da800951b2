//! Install and activate handlers.
//!
//! Install fills the current generation with the app shell, all or nothing.
//! Activate deletes every other generation.

use std::sync::Arc;

use futures_util::future::{join_all, try_join_all};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{AppConfig, CacheStorage, Error, InterceptedRequest, Network, RequestKey, Response};

/// What install stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub generation: String,
    pub cached: Vec<String>,
}

/// What activation removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivateReport {
    pub current: String,
    pub deleted: Vec<String>,
}

/// Pre-populates the current generation with the shell resources.
#[derive(Clone)]
pub struct Bootstrapper {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    generation: String,
    shell: Vec<Url>,
}

impl Bootstrapper {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        Ok(Self { storage, network, generation: config.cache_name.clone(), shell: config.shell_urls()? })
    }

    /// Fetch every shell resource concurrently and store them in one batch.
    ///
    /// # Errors
    ///
    /// `Error::InstallFailed` if any fetch fails or answers with a non-2xx
    /// status; nothing is written in that case.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.storage.open(&self.generation).await?;

        let fetches = self.shell.iter().map(|url| self.fetch_one(url));
        let entries = try_join_all(fetches).await?;

        self.storage.put_all(&self.generation, &entries).await?;

        let cached: Vec<String> = entries.into_iter().map(|(key, _)| key.url).collect();
        tracing::info!(generation = %self.generation, resources = cached.len(), "installed app shell");

        Ok(InstallReport { generation: self.generation.clone(), cached })
    }

    async fn fetch_one(&self, url: &Url) -> Result<(RequestKey, Response), Error> {
        let request = InterceptedRequest::get(url.clone());
        let response = self
            .network
            .fetch(&request)
            .await
            .map_err(|e| Error::InstallFailed { url: url.to_string(), reason: e.to_string() })?;

        if !response.is_ok() {
            return Err(Error::InstallFailed { url: url.to_string(), reason: format!("status {}", response.status) });
        }

        Ok((request.key(), response))
    }
}

/// Deletes every generation except the current one.
#[derive(Clone)]
pub struct GenerationReaper {
    storage: Arc<dyn CacheStorage>,
    current: String,
}

impl GenerationReaper {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage, current: config.cache_name.clone() }
    }

    /// Marks the current generation activated, then deletes the rest.
    ///
    /// Deletion is best-effort: a generation that fails to delete is logged
    /// and skipped.
    ///
    /// # Errors
    ///
    /// If the activation mark cannot be written or the generation names
    /// cannot be listed.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.storage.set_activated(&self.current).await?;

        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != &self.current)
            .collect();

        let results = join_all(stale.iter().map(|name| self.storage.delete(name))).await;

        let mut deleted = Vec::new();
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(true) => deleted.push(name),
                Ok(false) => {}
                Err(e) => tracing::warn!(generation = %name, error = %e, "failed to delete stale generation"),
            }
        }

        tracing::info!(current = %self.current, deleted = deleted.len(), "activated");
        Ok(ActivateReport { current: self.current.clone(), deleted })
    }
}
