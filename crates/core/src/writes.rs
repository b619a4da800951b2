//! Fire-and-forget cache writes.
//!
//! Each write runs as a detached tokio task. The response is returned to
//! the requester without waiting for it, and a failed write is logged and
//! dropped: persistence is at-most-once and best-effort.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::{CacheStorage, RequestKey, Response};

/// Tracks detached writes so a host can drain them on shutdown.
#[derive(Debug, Clone, Default)]
pub struct WriteQueue {
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `response` under `key` in the background.
    pub fn spawn_put(
        &self, storage: Arc<dyn CacheStorage>, generation: String, key: RequestKey, response: Response,
    ) {
        let handle = tokio::spawn(async move {
            match storage.put(&generation, &key, &response).await {
                Ok(()) => tracing::debug!(url = %key.url, generation = %generation, "cached response"),
                Err(e) => tracing::debug!(url = %key.url, error = %e, "cache write dropped"),
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Writes spawned and not yet observed as finished.
    pub fn pending(&self) -> usize {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every write spawned so far.
    ///
    /// A write whose task panicked or was aborted is logged and skipped.
    pub async fn flush(&self) {
        for handle in self.take() {
            if let Err(e) = handle.await {
                tracing::debug!(error = %e, "cache write task aborted");
            }
        }
    }

    /// Flush, giving up on writes still running after `grace`.
    ///
    /// Returns the number of writes that were abandoned.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let handles = self.take();
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();

        let drain = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::debug!(error = %e, "cache write task aborted");
                }
            }
        };
        if tokio::time::timeout(grace, drain).await.is_ok() {
            return 0;
        }

        let abandoned = aborts.iter().filter(|h| !h.is_finished()).count();
        aborts.iter().for_each(|h| h.abort());
        tracing::warn!(abandoned, "cache writes abandoned at shutdown");
        abandoned
    }

    fn take(&self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
