//! Configuration-distribution helper: a resilient connection manager to a
//! Redis-compatible broker plus a publisher that announces
//! configuration-change notifications on named channels.
//!
//! The broker itself, topic persistence and delivery guarantees are
//! externally owned; this crate only manages one outbound connection and
//! publishes messages.
//!
//! ```no_run
//! use configator::{ConnectionOptions, SettingPublisher};
//! use serde_json::json;
//!
//! # async fn run() {
//! let mut publisher = SettingPublisher::new(ConnectionOptions::default());
//! if let Some(err) = publisher.publish(json!({"key": "value"}), None, true).await {
//!     eprintln!("publish failed: {err}");
//! }
//! publisher.close();
//! # }
//! ```

pub mod engine;
pub mod error;

pub use engine::manager::{ConnectionManager, StopSignal};
pub use engine::message::{Label, Message, derive_channel};
pub use engine::publisher::SettingPublisher;
pub use engine::registry::{PublishRegistry, RegistryStats};
pub use engine::retry::{RetryStrategyCounter, default_retry_strategy};
pub use engine::settings::{ConnectionOptions, ConnectionSettings};
pub use engine::transport::{BrokerHandle, BrokerTransport, RedisTransport};
pub use error::{AppError, AppResult};
