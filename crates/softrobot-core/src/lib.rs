//! Soft-robot API access layer: error classification, retry with backoff,
//! transport selection (direct HTTP or host bridge) and the request client.

pub mod client;
pub mod config;
pub mod logging;
pub mod retry;
pub mod token;
pub mod transport;

pub use client::ApiClient;
