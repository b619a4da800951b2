//! Core types and caching logic for swproxy.
//!
//! This crate provides:
//! - Request filter and fetch strategies (network-first, cache-first)
//! - Install and activate lifecycle handlers over versioned cache generations
//! - Cache storage with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod network;
pub mod request;
pub mod response;
pub mod strategy;
pub mod worker;
pub mod writes;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::{CacheDb, CacheEntry, CacheStorage, MemoryStorage};
pub use config::{AppConfig, ConfigError, StorageKind};
pub use error::Error;
pub use filter::{Rejection, should_cache};
pub use lifecycle::{ActivateReport, InstallReport};
pub use network::{Network, NetworkError};
pub use request::{Destination, InterceptedRequest, RequestKey, RequestMode};
pub use response::Response;
pub use strategy::{FetchOutcome, ResponseSource};
pub use worker::{CacheProxy, Event, EventOutcome, LifecycleHandler, dispatch};
pub use writes::WriteQueue;
