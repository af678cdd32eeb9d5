//! Request signing for the HTTP bridge.
//!
//! The bridge authenticates a request with
//! `HMAC[SHA256]_{secret}(key | timestamp | seq | nonce | body)`, encoded as
//! URL-safe base64, and carried in the query string together with the values
//! that went into it.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac as _};
use rand::Rng as _;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use sha2::Sha256;

/// Largest nonce the bridge accepts: integers must stay exact as IEEE 754 doubles.
pub const MAX_NONCE: u64 = 1 << 53;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Source of the current time used for request timestamps.
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of single-use nonces.
pub trait NonceSource: fmt::Debug + Send + Sync {
    fn nonce(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Uniform nonces in `0..=MAX_NONCE` from the thread-local generator.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomNonce;

impl NonceSource for RandomNonce {
    fn nonce(&self) -> u64 {
        rand::rng().random_range(0..=MAX_NONCE)
    }
}

/// Query parameters attached to a signed request, in wire order.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignatureParams {
    pub timestamp: String,
    pub seq: String,
    pub nonce: u64,
    pub signature: String,
    pub key: String,
}

/// Formats `time` the way the bridge expects: millisecond precision with a `Z` suffix.
#[must_use]
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Computes the request signature over `key | timestamp | sequence | nonce | body`.
///
/// The parts are concatenated without delimiters, numbers in decimal.
#[must_use]
pub fn compute_signature(
    secret: &str,
    key: &str,
    sequence: u64,
    nonce: u64,
    timestamp: &str,
    body: &str,
) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");

    mac.update(key.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(sequence.to_string().as_bytes());
    mac.update(nonce.to_string().as_bytes());
    mac.update(body.as_bytes());

    let result = mac.finalize().into_bytes();
    URL_SAFE.encode(result)
}

/// Signs `body` for `sequence` with a fresh timestamp and nonce.
#[must_use]
pub fn sign(
    secret: &SecretString,
    key: &str,
    sequence: u64,
    body: &str,
    clock: &dyn Clock,
    nonces: &dyn NonceSource,
) -> SignatureParams {
    let timestamp = format_timestamp(clock.now());
    let nonce = nonces.nonce();
    let signature = compute_signature(
        secret.expose_secret(),
        key,
        sequence,
        nonce,
        &timestamp,
        body,
    );

    SignatureParams {
        timestamp,
        seq: sequence.to_string(),
        nonce,
        signature,
        key: key.to_owned(),
    }
}
