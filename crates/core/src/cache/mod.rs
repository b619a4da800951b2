//! Cache generations: named stores of response snapshots keyed by request
//! identity.
//!
//! Two backends implement [`CacheStorage`]:
//!
//! - [`CacheDb`]: SQLite via tokio-rusqlite, persisted across restarts,
//!   with versioned migrations and WAL mode
//! - [`MemoryStorage`]: volatile, for tests and throwaway runs

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStorage;
pub use storage::{CacheEntry, CacheStorage};
