//! In-memory storage backend.
//!
//! Holds generations in a tokio `RwLock`ed vector. Nothing survives a
//! restart; used as the test fake and for `storage = "memory"`.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::storage::{CacheEntry, CacheStorage, ensure_storable};
use crate::{Error, RequestKey, Response};

struct StoredEntry {
    key: RequestKey,
    response: Response,
    stored_at: String,
}

struct Generation {
    name: String,
    entries: Vec<StoredEntry>,
    activated: bool,
}

impl Generation {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), entries: Vec::new(), activated: false }
    }

    fn upsert(&mut self, key: &RequestKey, response: &Response, stored_at: &str) {
        let entry = StoredEntry { key: key.clone(), response: response.clone(), stored_at: stored_at.to_string() };
        match self.entries.iter_mut().find(|e| &e.key == key) {
            Some(existing) => {
                existing.response = entry.response;
                existing.stored_at = entry.stored_at;
            }
            None => self.entries.push(entry),
        }
    }
}

/// Volatile [`CacheStorage`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    generations: Arc<RwLock<Vec<Generation>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(generations: &[Generation], name: &str) -> Option<usize> {
        generations.iter().position(|g| g.name == name)
    }

    fn open_mut<'a>(generations: &'a mut Vec<Generation>, name: &str) -> &'a mut Generation {
        let idx = match Self::position(generations, name) {
            Some(idx) => idx,
            None => {
                generations.push(Generation::new(name));
                generations.len() - 1
            }
        };
        &mut generations[idx]
    }
}

#[async_trait::async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        Self::open_mut(&mut generations, generation);
        Ok(())
    }

    async fn has(&self, generation: &str) -> Result<bool, Error> {
        let generations = self.generations.read().await;
        Ok(Self::position(&generations, generation).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let generations = self.generations.read().await;
        Ok(generations.iter().map(|g| g.name.clone()).collect())
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        let mut generations = self.generations.write().await;
        match Self::position(&generations, generation) {
            Some(idx) => {
                generations.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn match_request(&self, generation: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let generations = self.generations.read().await;
        let found = generations
            .iter()
            .find(|g| g.name == generation)
            .and_then(|g| g.entries.iter().find(|e| &e.key == key))
            .map(|e| e.response.clone());
        Ok(found)
    }

    async fn put(&self, generation: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        ensure_storable(key)?;
        let stored_at = chrono::Utc::now().to_rfc3339();
        let mut generations = self.generations.write().await;
        Self::open_mut(&mut generations, generation).upsert(key, response, &stored_at);
        Ok(())
    }

    async fn put_all(&self, generation: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        for (key, _) in entries {
            ensure_storable(key)?;
        }
        let stored_at = chrono::Utc::now().to_rfc3339();
        let mut generations = self.generations.write().await;
        let target = Self::open_mut(&mut generations, generation);
        for (key, response) in entries {
            target.upsert(key, response, &stored_at);
        }
        Ok(())
    }

    async fn entries(&self, generation: &str) -> Result<Vec<CacheEntry>, Error> {
        let generations = self.generations.read().await;
        let entries = generations
            .iter()
            .find(|g| g.name == generation)
            .map(|g| {
                g.entries
                    .iter()
                    .map(|e| CacheEntry {
                        method: e.key.method.clone(),
                        url: e.key.url.clone(),
                        status: e.response.status,
                        stored_at: e.stored_at.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(entries)
    }

    async fn set_activated(&self, generation: &str) -> Result<(), Error> {
        let mut generations = self.generations.write().await;
        if Self::position(&generations, generation).is_some() {
            for g in generations.iter_mut() {
                g.activated = g.name == generation;
            }
        }
        Ok(())
    }

    async fn activated(&self) -> Result<Option<String>, Error> {
        let generations = self.generations.read().await;
        Ok(generations.iter().find(|g| g.activated).map(|g| g.name.clone()))
    }
}
