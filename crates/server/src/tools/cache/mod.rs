//! Cache-related MCP tools.
//!
//! Read-only views over the cache generations.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::keys_impl;
