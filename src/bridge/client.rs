use std::fmt;
use std::sync::{Arc, Mutex};

use reqwest::Method;
use secrecy::SecretString;
use serde_json::{Map, Value};
use url::Url;

use crate::Result;
use crate::auth::{self, Clock, NonceSource, RandomNonce, SystemClock};
use crate::bridge::transform::PreSerialize;
use crate::bridge::{CallPayload, Config};
use crate::error::{Error, Kind};
use crate::transport::{HttpTransport, Response, Transport};

const LOG_TARGET: &str = "crossbar_http";

/// Client for a router's HTTP bridge.
///
/// Every request made through one client carries the next value of its
/// sequence counter, starting at 1. Clients are `Send + Sync` and may be
/// shared; sequence assignment and signing happen under one lock.
pub struct Client {
    url: Url,
    key: Option<String>,
    secret: Option<SecretString>,
    verbose: bool,
    pre_serialize: Option<Arc<dyn PreSerialize>>,
    clock: Arc<dyn Clock>,
    nonces: Arc<dyn NonceSource>,
    sequence: Mutex<u64>,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Creates an unsigned client for `url`.
    pub fn new(url: &str) -> Result<Self> {
        Self::from_config(Config::builder().url(url).build())
    }

    /// Creates a client that signs every request with `key` and `secret`.
    pub fn with_credentials(url: &str, key: &str, secret: &str) -> Result<Self> {
        Self::from_config(Config::from_raw(url, Some(key), Some(secret))?)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        Self::with_transport(config, HttpTransport::try_new()?)
    }

    /// Creates a client that sends requests through a custom [`Transport`].
    pub fn with_transport<T: Transport + 'static>(config: Config, transport: T) -> Result<Self> {
        let url = config.parsed_url()?;

        Ok(Self {
            url,
            key: config.key,
            secret: config.secret,
            verbose: config.verbose,
            pre_serialize: config.pre_serialize,
            clock: config.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            nonces: config.nonces.unwrap_or_else(|| Arc::new(RandomNonce)),
            sequence: Mutex::new(1),
            transport: Arc::new(transport),
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// `true` when requests with a body will be signed.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.key.is_some() && self.secret.is_some()
    }

    /// Sequence number the next request will carry.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        match self.sequence.lock() {
            Ok(sequence) => *sequence,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Publishes an event to `topic`.
    ///
    /// Returns the bridge's decoded answer, typically `{"id": <publication id>}`.
    pub async fn publish(
        &self,
        topic: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value> {
        self.ensure_url()?;

        let payload = CallPayload::publish(topic, args, kwargs);
        self.make_api_call(Some(&payload)).await
    }

    /// Calls the remote `procedure` and returns its decoded result.
    pub async fn call(
        &self,
        procedure: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value> {
        self.ensure_url()?;

        let payload = CallPayload::call(procedure, args, kwargs);
        self.make_api_call(Some(&payload)).await
    }

    /// Runs one request through the pipeline: encode, sign, sequence, send, decode.
    ///
    /// Without a payload the request goes out with no body and unsigned, but
    /// still consumes a sequence number.
    pub async fn make_api_call(&self, payload: Option<&CallPayload>) -> Result<Value> {
        if self.verbose {
            tracing::info!(target: LOG_TARGET, "Request: POST {}", self.url);
        }

        let body = payload.map(|p| self.encode(p)).transpose()?;
        if self.verbose
            && let Some(body) = &body
        {
            tracing::info!(target: LOG_TARGET, "Params: {body}");
        }

        let uri = self.prepare_uri(body.as_deref())?;
        tracing::trace!(
            target: LOG_TARGET,
            %uri,
            has_body = body.is_some(),
            "sending bridge request"
        );

        let response = self.transport.send(uri.clone(), body).await?;
        self.handle_response(&uri, response)
    }

    /// Construction already rejects URLs without a host, so this only fails
    /// if that invariant is broken.
    fn ensure_url(&self) -> Result<()> {
        if self.url.has_host() {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "bridge url must name a host, got `{}`",
                self.url
            )))
        }
    }

    fn encode(&self, payload: &CallPayload) -> Result<String> {
        let body = match &self.pre_serialize {
            Some(hook) => serde_json::to_string(&payload.transformed(hook.as_ref()))?,
            None => serde_json::to_string(payload)?,
        };
        Ok(body)
    }

    /// Takes the next sequence number and, for signed clients, replaces the
    /// query with the signature parameters computed over `body`.
    fn prepare_uri(&self, body: Option<&str>) -> Result<Url> {
        let mut uri = self.url.clone();
        let mut sequence = self.sequence.lock()?;
        let current = *sequence;
        *sequence += 1;

        let credentials = self.key.as_deref().zip(self.secret.as_ref());
        let mut signed = false;
        if let (Some((key, secret)), Some(body)) = (credentials, body.filter(|b| !b.is_empty())) {
            let params = auth::sign(
                secret,
                key,
                current,
                body,
                self.clock.as_ref(),
                self.nonces.as_ref(),
            );
            let query = serde_html_form::to_string(&params)
                .map_err(|e| Error::with_source(Kind::Encoding, e))?;
            uri.set_query(Some(&query));
            signed = true;

            if self.verbose {
                tracing::info!(target: LOG_TARGET, ?params, "Signature Params");
            }
        }
        drop(sequence);

        tracing::debug!(
            target: LOG_TARGET,
            sequence = current,
            signed,
            "prepared bridge request"
        );
        Ok(uri)
    }

    fn handle_response(&self, uri: &Url, response: Response) -> Result<Value> {
        if !response.status.is_success() {
            tracing::debug!(
                target: LOG_TARGET,
                status = %response.status,
                "bridge returned an error"
            );
            return Err(Error::status(
                response.status,
                Method::POST,
                uri.path().to_owned(),
                response.reason,
            ));
        }

        if self.verbose {
            tracing::info!(target: LOG_TARGET, "Response Body: {}", response.body);
        }

        // 204 and friends carry nothing to decode
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&response.body)?)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url.as_str())
            .field("key", &self.key)
            .field("secret", &self.secret)
            .field("verbose", &self.verbose)
            .field("pre_serialize", &self.pre_serialize.is_some())
            .field("sequence", &self.sequence())
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Default)]
    struct Recorder(Mutex<Vec<(Url, Option<String>)>>);

    #[async_trait]
    impl Transport for Recorder {
        async fn send(&self, uri: Url, body: Option<String>) -> Result<Response> {
            self.0.lock()?.push((uri, body));
            Ok(Response::new(StatusCode::OK, "{}"))
        }
    }

    #[tokio::test]
    async fn absent_payload_sends_no_body_and_skips_signing() {
        let config = Config::from_raw("http://localhost/call", Some("key"), Some("secret"))
            .expect("valid config");
        let recorder = Arc::new(Recorder::default());
        let client = Client::with_transport(config, Arc::clone(&recorder)).expect("client");

        client.make_api_call(None).await.expect("request succeeds");

        let sent = recorder.0.lock().expect("lock");
        assert_eq!(sent.len(), 1, "one request sent");
        assert_eq!(sent[0].0.query(), None, "no signature without a body");
        assert_eq!(sent[0].1, None, "no body without a payload");
        assert_eq!(client.sequence(), 2, "sequence still advances");
    }

    #[tokio::test]
    async fn empty_topic_is_left_to_the_bridge() {
        let recorder = Arc::new(Recorder::default());
        let config = Config::builder().url("http://localhost/publish").build();
        let client = Client::with_transport(config, Arc::clone(&recorder)).expect("client");

        client
            .publish("", vec![json!(1)], Map::new())
            .await
            .expect("empty topic is sent as is");
        client
            .call("", Vec::new(), Map::new())
            .await
            .expect("empty procedure is sent as is");

        let sent = recorder.0.lock().expect("lock");
        assert_eq!(sent.len(), 2, "both requests sent");
        assert_eq!(
            sent[0].1.as_deref(),
            Some(r#"{"topic":"","args":[1],"kwargs":{}}"#)
        );
        assert_eq!(client.sequence(), 3, "both consumed a sequence number");
    }

    #[tokio::test]
    async fn empty_response_body_decodes_to_null() {
        #[derive(Debug)]
        struct NoContent;

        #[async_trait]
        impl Transport for NoContent {
            async fn send(&self, _uri: Url, _body: Option<String>) -> Result<Response> {
                Ok(Response::new(StatusCode::NO_CONTENT, ""))
            }
        }

        let client = Client::with_transport(
            Config::builder().url("http://localhost/publish").build(),
            NoContent,
        )
        .expect("client");

        let value = client
            .publish("com.example.topic", Vec::new(), Map::new())
            .await
            .expect("204 is a success");
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn debug_hides_secret() {
        let client = Client::with_credentials("http://localhost/call", "key", "hunter2")
            .expect("client");

        let debug = format!("{client:?}");
        assert!(!debug.contains("hunter2"), "secret leaked into Debug");
        assert!(client.is_signed(), "credentials were given");
    }
}
