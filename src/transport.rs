use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client as ReqwestClient, StatusCode};
use url::Url;

use crate::Result;

/// Raw answer from the bridge, before status handling and JSON decoding.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub reason: String,
    pub body: String,
}

impl Response {
    /// Builds a response whose reason is the canonical phrase for `status`.
    #[must_use]
    pub fn new<S: Into<String>>(status: StatusCode, body: S) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            body: body.into(),
        }
    }
}

/// Moves one encoded request to the bridge and returns whatever it answered.
///
/// Implementations report only transport-level failures as errors; a non-2xx
/// answer is a successful [`Response`].
#[async_trait]
pub trait Transport: std::fmt::Debug + Send + Sync {
    async fn send(&self, uri: Url, body: Option<String>) -> Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, uri: Url, body: Option<String>) -> Result<Response> {
        (**self).send(uri, body).await
    }
}

/// [`Transport`] over `reqwest`. TLS is used when the URL scheme is `https`.
///
/// Redirects are never followed: a 3xx answer is handed back as is and
/// fails the request like any other non-2xx status.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    /// Builds a transport on a fresh `reqwest` client with redirects disabled.
    pub fn try_new() -> Result<Self> {
        let client = ReqwestClient::builder()
            .redirect(Policy::none())
            .build()?;

        Ok(Self { client })
    }

    /// Wraps a preconfigured `reqwest` client.
    ///
    /// The client should be built with [`Policy::none`]; with reqwest's
    /// default policy a 302 or 303 is re-sent as a bodiless `GET` to the new
    /// location instead of being reported.
    #[must_use]
    pub fn new(client: ReqwestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, uri: Url, body: Option<String>) -> Result<Response> {
        let mut request = self
            .client
            .post(uri)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(Response::new(status, body))
    }
}
