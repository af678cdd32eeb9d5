use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;
use std::sync::PoisonError;

use reqwest::{Method, StatusCode};

/// Broad category of an [`Error`].
#[non_exhaustive]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Kind {
    /// The bridge answered with a non-2xx status.
    Status,
    /// Missing or malformed client input, rejected before anything is sent.
    Validation,
    /// Network or TLS failure reported by the transport.
    Transport,
    /// A payload could not be encoded, or a response body could not be decoded.
    Encoding,
    /// The sequence lock was poisoned by a panicking caller.
    Synchronization,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    pub fn status<S: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: String,
        message: S,
    ) -> Self {
        Status {
            status_code,
            method,
            path,
            message: message.into(),
        }
        .into()
    }

    /// Status code of a [`Kind::Status`] error.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.downcast_ref::<Status>().map(|s| s.status_code)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Non-2xx answer from the bridge.
#[non_exhaustive]
#[derive(Debug)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error({}) making {} call to {} with {}",
            self.status_code, self.method, self.path, self.message
        )
    }
}

impl StdError for Status {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

#[non_exhaustive]
#[derive(Debug)]
pub struct Synchronization;

impl fmt::Display for Synchronization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sequence lock poisoned by a panicked request")
    }
}

impl StdError for Synchronization {}

impl From<Status> for Error {
    fn from(e: Status) -> Self {
        Error::with_source(Kind::Status, e)
    }
}

impl From<Validation> for Error {
    fn from(e: Validation) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Transport, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Encoding, e)
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_poisoned: PoisonError<T>) -> Self {
        Error::with_source(Kind::Synchronization, Synchronization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_exposes_code() {
        let err = Error::status(
            StatusCode::NOT_FOUND,
            Method::POST,
            "/bridge".to_owned(),
            "Not Found",
        );

        assert_eq!(err.kind(), Kind::Status, "kind should be Status");
        assert_eq!(err.status_code(), Some(StatusCode::NOT_FOUND), "code should be kept");
        assert_eq!(
            err.to_string(),
            "Status: error(404 Not Found) making POST call to /bridge with Not Found"
        );
    }

    #[test]
    fn validation_error_has_no_status_code() {
        let err = Error::validation("url must not be empty");

        assert_eq!(err.kind(), Kind::Validation, "kind should be Validation");
        assert!(err.status_code().is_none(), "validation carries no status");
        assert_eq!(err.to_string(), "Validation: invalid: url must not be empty");
    }
}
