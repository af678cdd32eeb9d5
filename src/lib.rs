#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod auth;
pub mod bridge;
pub mod error;
pub mod transport;

pub use bridge::{CallPayload, Client, Config, PreSerialize};
pub use error::{Error, Kind};
pub use transport::{HttpTransport, Response, Transport};

pub type Result<T> = std::result::Result<T, Error>;

/// Re-exported so callers can build `args` and `kwargs` without a direct dependency.
pub use serde_json::{Map, Value, json};
