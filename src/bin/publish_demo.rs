// Publishes two sample notifications the way an operator script would.
//
// Run with:
//   CONFIGATOR_REDIS_HOST=127.0.0.1 cargo run --bin publish_demo

use anyhow::Result;
use configator::{ConnectionOptions, SettingPublisher};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    let mut publisher = SettingPublisher::new(ConnectionOptions::default());

    publisher
        .publish_or_error(
            json!({"84973407138": "dev_8091"}),
            Some("PROXY_JOIN_SANDBOX".into()),
            false,
        )
        .await?;

    publisher
        .publish_or_error("Hello world", Some("PROXY_STOP_SANDBOX".into()), false)
        .await?;

    publisher.close();
    Ok(())
}
