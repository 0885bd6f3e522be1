use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error};

use crate::engine::retry::{RetryStrategy, RetryStrategyCounter, default_retry_strategy};
use crate::engine::settings::{ConnectionOptions, ConnectionSettings};
use crate::engine::transport::{BrokerHandle, BrokerTransport, RedisTransport};
use crate::error::{AppError, AppResult};

/// Cloneable view of the manager's running flag. Clearing it from another
/// task aborts an in-flight retry loop at its next iteration boundary.
#[derive(Debug, Clone)]
pub struct StopSignal {
    running: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Owns at most one live broker connection and the retry policy used to
/// (re)acquire it.
///
/// Not internally synchronized: one logical caller at a time. The only
/// cross-task interaction is [`StopSignal`], which cancels a retry loop
/// that would otherwise wait out the broker.
pub struct ConnectionManager<T: BrokerTransport> {
    transport: T,
    settings: ConnectionSettings,
    handle: Option<T::Handle>,
    retry: RetryStrategyCounter,
    strategy: RetryStrategy,
    running: Arc<AtomicBool>,
}

impl ConnectionManager<RedisTransport> {
    /// Manager over the real Redis transport, settings resolved from
    /// constructor options + environment.
    pub fn from_options(opts: ConnectionOptions) -> Self {
        Self::new(RedisTransport, ConnectionSettings::build(opts))
    }
}

impl<T: BrokerTransport> ConnectionManager<T> {
    pub fn new(transport: T, settings: ConnectionSettings) -> Self {
        Self {
            transport,
            settings,
            handle: None,
            retry: RetryStrategyCounter::new(),
            strategy: Box::new(default_retry_strategy),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    pub fn stop_signal(&self) -> StopSignal {
        StopSignal {
            running: Arc::clone(&self.running),
        }
    }

    /// Install a custom backoff strategy. The default is
    /// [`default_retry_strategy`].
    pub fn set_retry_strategy<F>(&mut self, strategy: F)
    where
        F: Fn(u32, f64) -> f64 + Send + Sync + 'static,
    {
        self.strategy = Box::new(strategy);
    }

    /// Acquire a connection, creating one lazily on first use.
    ///
    /// With `validate`, the handle must answer a ping before it is handed
    /// out; a successful ping resets the retry attempt counter. On a
    /// connectivity error the dead handle is dropped and, when `retrying`,
    /// the loop sleeps for the strategy-computed delay and tries the whole
    /// acquire+validate step again. Clearing the [`StopSignal`] ends the
    /// loop with [`AppError::Closed`]. Non-connectivity errors propagate
    /// immediately.
    pub async fn connect(&mut self, validate: bool, retrying: bool) -> AppResult<&mut T::Handle> {
        self.running.store(true, Ordering::SeqCst);

        while self.running.load(Ordering::SeqCst) {
            match self.acquire(validate).await {
                Ok(()) => {
                    return self.handle.as_mut().ok_or(AppError::Closed);
                }
                Err(err) if err.is_connectivity() => {
                    if !retrying {
                        return Err(err);
                    }
                    let delay = self.retry.delay(&*self.strategy);
                    error!(
                        error = %err,
                        delay_secs = delay,
                        "broker connectivity error, reconnecting after delay"
                    );
                    sleep(Duration::from_secs_f64(delay)).await;
                }
                Err(err) => return Err(err),
            }
        }

        Err(AppError::Closed)
    }

    /// Drop the current handle (if any) and connect again with validation
    /// and retries.
    pub async fn reconnect(&mut self) -> AppResult<&mut T::Handle> {
        self.teardown();
        self.connect(true, true).await
    }

    /// Clear the running flag and release the connection.
    pub fn close(&mut self) {
        self.teardown();
        debug!("connection manager closed");
    }

    /// One try of the acquire+validate step.
    async fn acquire(&mut self, validate: bool) -> AppResult<()> {
        if self.handle.is_none() {
            debug!(
                host = %self.settings.host,
                port = self.settings.port,
                db = self.settings.db,
                "opening broker connection"
            );
            self.handle = Some(self.transport.open(&self.settings).await?);
        }

        if validate {
            let handle = self.handle.as_mut().ok_or(AppError::Closed)?;
            match handle.ping().await {
                Ok(()) => self.retry.reset(),
                Err(err) => {
                    if err.is_connectivity() {
                        // The handle is dead; the next pass reopens it.
                        self.handle = None;
                    }
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    /// Single teardown path: used by close() and reconnect().
    fn teardown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.handle = None;
    }
}
