// tests/publish_flow.rs
//
// End-to-end publish flow over an in-memory fake broker, exercising only
// the public API: channel naming, payload round-trips, retry-until-
// reachable behavior and stop-signal cancellation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use configator::{
    AppError, AppResult, BrokerHandle, BrokerTransport, ConnectionManager, ConnectionOptions,
    ConnectionSettings, SettingPublisher,
};
use serde_json::{Value, json};
use tokio::time::sleep;

/// Fake broker: refuses the first `fail_opens` connection attempts, then
/// accepts and records every publish.
#[derive(Debug, Clone, Default)]
struct FakeBroker {
    fail_opens: Arc<AtomicU32>,
    opened: Arc<AtomicU32>,
    published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

#[derive(Debug)]
struct FakeHandle {
    id: u32,
    published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

#[async_trait]
impl BrokerTransport for FakeBroker {
    type Handle = FakeHandle;

    async fn open(&self, _settings: &ConnectionSettings) -> AppResult<Self::Handle> {
        let refuse = self
            .fail_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
            .is_ok();
        if refuse {
            return Err(AppError::Connectivity("connection refused".into()));
        }
        Ok(FakeHandle {
            id: self.opened.fetch_add(1, Ordering::SeqCst) + 1,
            published: Arc::clone(&self.published),
        })
    }
}

#[async_trait]
impl BrokerHandle for FakeHandle {
    async fn ping(&mut self) -> AppResult<()> {
        Ok(())
    }

    async fn publish(&mut self, channel: &str, payload: &[u8]) -> AppResult<()> {
        self.published
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.to_vec()));
        Ok(())
    }
}

fn settings(group: &str) -> ConnectionSettings {
    ConnectionSettings::build(ConnectionOptions {
        channel_group: Some(group.into()),
        env_prefix: Some("CFGFLOW".into()),
        ..Default::default()
    })
}

fn publisher(broker: &FakeBroker, group: &str) -> SettingPublisher<FakeBroker> {
    SettingPublisher::with_manager(ConnectionManager::new(broker.clone(), settings(group)))
}

#[tokio::test]
async fn publishes_map_and_text_on_derived_channels() {
    let broker = FakeBroker::default();
    let mut p = publisher(&broker, "grp");

    p.publish_or_error(json!({"84973407138": "dev_8091"}), None, false)
        .await
        .unwrap();
    p.publish_or_error("Hello world", Some("PROXY_STOP_SANDBOX".into()), false)
        .await
        .unwrap();

    let published = broker.published.lock().unwrap();
    assert_eq!(published.len(), 2);

    assert_eq!(published[0].0, "grp");
    let back: Value = serde_json::from_slice(&published[0].1).unwrap();
    assert_eq!(back, json!({"84973407138": "dev_8091"}));

    assert_eq!(published[1].0, "grp:PROXY_STOP_SANDBOX");
    assert_eq!(published[1].1, b"Hello world");
}

#[tokio::test(start_paused = true)]
async fn publish_waits_out_an_unreachable_broker() {
    let broker = FakeBroker::default();
    broker.fail_opens.store(4, Ordering::SeqCst);
    let mut p = publisher(&broker, "grp");

    // Blocks through four failed attempts (0.5 + 1.0 + 1.5 + 2.0 seconds
    // of backoff under the default strategy), then goes through.
    p.publish_or_error("eventually", None, false).await.unwrap();

    assert_eq!(broker.opened.load(Ordering::SeqCst), 1);
    assert_eq!(broker.published.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn connect_without_retrying_fails_fast() {
    let broker = FakeBroker::default();
    broker.fail_opens.store(1, Ordering::SeqCst);
    let mut m = ConnectionManager::new(broker.clone(), settings("grp"));

    let err = m.connect(true, false).await.unwrap_err();
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn close_yields_a_fresh_handle_on_reconnect() {
    let broker = FakeBroker::default();
    let mut m = ConnectionManager::new(broker.clone(), settings("grp"));

    let first = m.connect(true, true).await.unwrap().id;
    m.close();
    let second = m.connect(true, true).await.unwrap().id;

    assert_ne!(first, second);
}

#[tokio::test(start_paused = true)]
async fn stop_signal_cancels_a_blocked_publish() {
    let broker = FakeBroker::default();
    broker.fail_opens.store(u32::MAX, Ordering::SeqCst);
    let mut p = publisher(&broker, "grp");

    let stop = p.stop_signal();
    tokio::spawn(async move {
        sleep(Duration::from_millis(100)).await;
        stop.stop();
    });

    let err = p
        .publish_or_error("never sent", None, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Closed));
    assert!(broker.published.lock().unwrap().is_empty());
}
