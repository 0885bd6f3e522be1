use async_trait::async_trait;
use redis::aio::ConnectionManager as ManagedConnection;

use crate::engine::settings::ConnectionSettings;
use crate::error::{AppError, AppResult};

/// A live connection to the broker. Deliberately minimal: the engine only
/// ever needs a liveness probe and a fire-and-forget publish.
#[async_trait]
pub trait BrokerHandle: Send {
    async fn ping(&mut self) -> AppResult<()>;

    async fn publish(&mut self, channel: &str, payload: &[u8]) -> AppResult<()>;
}

/// Opens broker connections. The engine treats this as an opaque factory so
/// tests can substitute fakes for the real Redis transport.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    type Handle: BrokerHandle;

    /// Open a fresh connection. May fail with a connectivity error, which
    /// the connect loop retries; anything else propagates.
    async fn open(&self, settings: &ConnectionSettings) -> AppResult<Self::Handle>;
}

/// Production transport over redis-rs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisTransport;

pub struct RedisHandle {
    conn: ManagedConnection,
}

#[async_trait]
impl BrokerTransport for RedisTransport {
    type Handle = RedisHandle;

    async fn open(&self, settings: &ConnectionSettings) -> AppResult<Self::Handle> {
        let info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(settings.host.clone(), settings.port),
            redis: redis::RedisConnectionInfo {
                db: settings.db,
                username: settings.username.clone(),
                password: settings.password.clone(),
                ..Default::default()
            },
        };

        // Client::open only validates the connection info; no I/O yet.
        let client = redis::Client::open(info)
            .map_err(|e| AppError::InvalidConfig(format!("invalid redis connection info: {e}")))?;

        // This is where the broker is actually contacted.
        let conn = ManagedConnection::new(client).await?;

        Ok(RedisHandle { conn })
    }
}

#[async_trait]
impl BrokerHandle for RedisHandle {
    async fn ping(&mut self) -> AppResult<()> {
        let pong: String = redis::cmd("PING").query_async(&mut self.conn).await?;
        if pong != "PONG" {
            return Err(AppError::Connectivity(format!(
                "PING returned '{pong}' instead of PONG"
            )));
        }
        Ok(())
    }

    async fn publish(&mut self, channel: &str, payload: &[u8]) -> AppResult<()> {
        // PUBLISH returns the receiver count; delivery is the broker's
        // problem, so we ignore it.
        let _receivers: i64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(payload)
            .query_async(&mut self.conn)
            .await?;
        Ok(())
    }
}
