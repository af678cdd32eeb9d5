//! Client for the router's HTTP bridge.
//!
//! The bridge exposes two operations over `POST`:
//! - publish an event to a topic
//! - call a remote procedure and return its result
//!
//! When a key and secret are configured, each request is signed and carries
//! `timestamp`, `seq`, `nonce`, `signature` and `key` in its query string.

mod client;
mod config;
mod transform;
mod types;

pub use client::Client;
pub use config::Config;
pub use transform::PreSerialize;
pub use types::CallPayload;
