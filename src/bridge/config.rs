use std::fmt;
use std::sync::Arc;

use bon::Builder;
use secrecy::SecretString;
use url::Url;

use crate::Result;
use crate::auth::{Clock, NonceSource};
use crate::bridge::transform::PreSerialize;
use crate::error::Error;

/// Bridge client configuration.
///
/// ```
/// use crossbar_http_client::bridge::Config;
///
/// let config = Config::builder()
///     .url("https://router.example.com/call")
///     .key("client")
///     .secret("s3cr3t".to_owned())
///     .verbose(true)
///     .build();
/// # let _ = config;
/// ```
#[non_exhaustive]
#[derive(Clone, Builder)]
pub struct Config {
    /// URL of the router's HTTP bridge endpoint.
    #[builder(into)]
    pub url: String,
    #[builder(into)]
    pub key: Option<String>,
    #[builder(into)]
    pub secret: Option<SecretString>,
    /// Log requests, signature parameters and response bodies.
    #[builder(default)]
    pub verbose: bool,
    pub pre_serialize: Option<Arc<dyn PreSerialize>>,
    /// Overrides the wall clock used for signature timestamps.
    pub clock: Option<Arc<dyn Clock>>,
    /// Overrides the random nonce generator.
    pub nonces: Option<Arc<dyn NonceSource>>,
}

impl Config {
    /// Builds a configuration from plain string values, as read from an
    /// application config file or the environment.
    pub fn from_raw(url: &str, key: Option<&str>, secret: Option<&str>) -> Result<Self> {
        let config = Config::builder()
            .url(url)
            .maybe_key(key)
            .maybe_secret(secret.map(str::to_owned))
            .build();

        config.parsed_url()?;
        Ok(config)
    }

    /// Parses and checks the endpoint URL.
    pub(crate) fn parsed_url(&self) -> Result<Url> {
        validate_url(&self.url)
    }

    /// `true` when both halves of the credentials are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.key.is_some() && self.secret.is_some()
    }
}

fn validate_url(url: &str) -> Result<Url> {
    if url.trim().is_empty() {
        return Err(Error::validation("bridge url can not be empty"));
    }

    let parsed = Url::parse(url)?;
    if !parsed.has_host() {
        return Err(Error::validation(format!(
            "bridge url must name a host, got `{url}`"
        )));
    }

    Ok(parsed)
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("url", &self.url)
            .field("key", &self.key)
            .field("secret", &self.secret)
            .field("verbose", &self.verbose)
            .field("pre_serialize", &self.pre_serialize.is_some())
            .field("clock", &self.clock)
            .field("nonces", &self.nonces)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Kind;

    use super::*;

    #[test]
    fn from_raw_accepts_plain_strings() {
        let config = Config::from_raw("http://localhost:8080/call", Some("key"), Some("secret"))
            .expect("valid config");

        assert!(config.has_credentials(), "key and secret were both given");
        assert!(!config.verbose, "verbose defaults to off");
    }

    #[test]
    fn empty_url_is_rejected() {
        let err = Config::from_raw("", None, None).expect_err("empty url");

        assert_eq!(err.kind(), Kind::Validation, "empty url is a validation error");
    }

    #[test]
    fn unparsable_url_is_rejected() {
        let err = Config::from_raw("not a url", None, None).expect_err("bad url");

        assert_eq!(err.kind(), Kind::Validation, "parse failures are validation errors");
    }

    #[test]
    fn debug_redacts_secret() {
        let config = Config::from_raw("http://localhost/call", Some("key"), Some("hunter2"))
            .expect("valid config");

        assert!(!format!("{config:?}").contains("hunter2"), "secret leaked into Debug");
    }
}
