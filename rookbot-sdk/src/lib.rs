//! Wire types and a resilient client for the Lichess bot API.
//!
//! The [`objects`] module is always available. The HTTP client, retry
//! policies and stream reader live in [`client`] behind the `client` feature.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod config;
pub mod ndjson;
pub mod objects;
