//! Publishes an event and calls a procedure through a router's HTTP bridge.
//!
//! ```sh
//! CROSSBAR_HTTP_PUBLISH_URL=http://127.0.0.1:8080/publish \
//! CROSSBAR_HTTP_CALL_URL=http://127.0.0.1:8080/call \
//! CROSSBAR_HTTP_KEY=foobar CROSSBAR_HTTP_SECRET=secret \
//! RUST_LOG=crossbar_http=info cargo run --example bridge
//! ```

use std::env;

use crossbar_http_client::{Client, Config, Map, json};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let key = env::var("CROSSBAR_HTTP_KEY").ok();
    let secret = env::var("CROSSBAR_HTTP_SECRET").ok();
    let client = |var: &str| -> anyhow::Result<Client> {
        let url = env::var(var)?;
        let mut config = Config::from_raw(&url, key.as_deref(), secret.as_deref())?;
        config.verbose = true;
        Ok(Client::from_config(config)?)
    };
    let publisher = client("CROSSBAR_HTTP_PUBLISH_URL")?;
    let caller = client("CROSSBAR_HTTP_CALL_URL")?;

    let mut kwargs = Map::new();
    kwargs.insert("source".to_owned(), json!("demo"));
    let published = publisher
        .publish("com.example.topic", vec![json!("hello")], kwargs)
        .await?;
    info!(%published, "published");

    let result = caller
        .call("com.example.add", vec![json!(2), json!(3)], Map::new())
        .await?;
    info!(%result, next_sequence = caller.sequence(), "called");

    Ok(())
}
