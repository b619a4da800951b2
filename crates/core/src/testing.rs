//! Test doubles for crates exercising the proxy without a real network.
//!
//! Compiled for this crate's tests and behind the `testing` feature.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{InterceptedRequest, Network, NetworkError, Response};

/// Network that answers from a fixed table and records every call.
///
/// Unknown URLs fail with a connection error, as does everything once
/// `offline` is set.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, response: Response) -> Self {
        lock(&self.routes).insert(url.to_string(), response);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        *lock(&self.offline) = offline;
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait::async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &InterceptedRequest) -> Result<Response, NetworkError> {
        let url = request.url.to_string();
        lock(&self.calls).push(url.clone());

        if *lock(&self.offline) {
            return Err(NetworkError::Connect("offline".into()));
        }

        lock(&self.routes)
            .get(&url)
            .cloned()
            .map(|r| r.with_url(url.clone()))
            .ok_or_else(|| NetworkError::Connect(format!("no route to {url}")))
    }
}
