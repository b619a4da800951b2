//! Storage interface for cache generations.

use serde::{Deserialize, Serialize};

use crate::{Error, RequestKey, Response};

/// Listing row for one stored response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheEntry {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub stored_at: String,
}

/// Named cache generations, each mapping a request identity to a response.
///
/// Writes to the same key overwrite (last write wins). Writing to a
/// generation that does not exist creates it; reading never does.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the generation if absent.
    async fn open(&self, generation: &str) -> Result<(), Error>;

    /// Whether a generation with this name exists.
    async fn has(&self, generation: &str) -> Result<bool, Error>;

    /// Generation names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation and all its entries. Returns false if it did not exist.
    async fn delete(&self, generation: &str) -> Result<bool, Error>;

    /// Look up a stored response.
    async fn match_request(&self, generation: &str, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Store a response, replacing any previous one for the key.
    async fn put(&self, generation: &str, key: &RequestKey, response: &Response) -> Result<(), Error>;

    /// Store several responses atomically: either all are written or none.
    async fn put_all(&self, generation: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error>;

    /// List the entries of a generation in insertion order.
    async fn entries(&self, generation: &str) -> Result<Vec<CacheEntry>, Error>;

    /// Mark `generation` as the one serving requests, clearing any earlier
    /// mark. No-op if the generation does not exist.
    async fn set_activated(&self, generation: &str) -> Result<(), Error>;

    /// The generation last marked activated, if it still exists.
    async fn activated(&self) -> Result<Option<String>, Error>;
}

/// Only `GET` requests may be stored.
pub(crate) fn ensure_storable(key: &RequestKey) -> Result<(), Error> {
    if key.method != "GET" {
        return Err(Error::InvalidInput(format!("cannot store {} request for {}", key.method, key.url)));
    }
    Ok(())
}
