//! Client code for swproxy.
//!
//! This crate provides the HTTP implementation of the proxy's network
//! interface, shared by the server and tests.

pub mod fetch;

pub use fetch::{FetchConfig, HttpNetwork};
