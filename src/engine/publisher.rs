use std::sync::Arc;

use tracing::{debug, error};

use crate::engine::manager::{ConnectionManager, StopSignal};
use crate::engine::message::{Label, Message, derive_channel};
use crate::engine::registry::PublishRegistry;
use crate::engine::settings::{ConnectionOptions, ConnectionSettings};
use crate::engine::transport::{BrokerHandle, BrokerTransport, RedisTransport};
use crate::error::{AppError, AppResult};

/// Publishes configuration-change notifications onto channels derived from
/// the configured channel group.
///
/// Connection handling is delegated to [`ConnectionManager`]: publishing
/// against an unreachable broker blocks in the retry loop until the broker
/// comes back or the [`StopSignal`] is cleared.
pub struct SettingPublisher<T: BrokerTransport = RedisTransport> {
    manager: ConnectionManager<T>,
    registry: Option<Arc<PublishRegistry>>,
}

impl SettingPublisher<RedisTransport> {
    pub fn new(opts: ConnectionOptions) -> Self {
        Self::with_manager(ConnectionManager::from_options(opts))
    }
}

impl<T: BrokerTransport> SettingPublisher<T> {
    pub fn with_manager(manager: ConnectionManager<T>) -> Self {
        Self {
            manager,
            registry: None,
        }
    }

    /// Report every successful publish into a caller-owned registry.
    pub fn with_registry(mut self, registry: Arc<PublishRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn settings(&self) -> &ConnectionSettings {
        self.manager.settings()
    }

    pub fn channel_group(&self) -> &str {
        &self.manager.settings().channel_group
    }

    /// Cancellation handle for a publish stuck in the connect retry loop.
    pub fn stop_signal(&self) -> StopSignal {
        self.manager.stop_signal()
    }

    /// Safe façade: never propagates, hands back the error as a value.
    pub async fn publish<M>(
        &mut self,
        message: M,
        label: Option<Label>,
        with_datetime: bool,
    ) -> Option<AppError>
    where
        M: TryInto<Message>,
        M::Error: Into<AppError>,
    {
        self.publish_or_error(message, label, with_datetime)
            .await
            .err()
    }

    /// Strict façade: validates, encodes, connects (with retries) and sends.
    pub async fn publish_or_error<M>(
        &mut self,
        message: M,
        label: Option<Label>,
        with_datetime: bool,
    ) -> AppResult<()>
    where
        M: TryInto<Message>,
        M::Error: Into<AppError>,
    {
        let message: Message = match message.try_into() {
            Ok(m) => m,
            Err(err) => {
                let err = err.into();
                error!(%err, "rejected publish message");
                return Err(err);
            }
        };

        let channel = match derive_channel(self.channel_group(), label) {
            Ok(c) => c,
            Err(err) => {
                error!(%err, "rejected publish label");
                return Err(err);
            }
        };

        let payload = match message.encode(with_datetime) {
            Ok(p) => p,
            Err(err) => {
                error!(%err, channel = %channel, "failed to encode message");
                return Err(err);
            }
        };

        debug!(
            channel = %channel,
            message_type = message.type_name(),
            payload_bytes = payload.len(),
            "publishing message"
        );

        let handle = self.manager.connect(false, true).await?;
        handle.publish(&channel, &payload).await?;

        if let Some(registry) = &self.registry {
            registry.track(&channel, payload.len());
        }

        Ok(())
    }

    /// Release the underlying connection.
    pub fn close(&mut self) {
        self.manager.close();
        debug!("setting publisher closed");
    }
}
