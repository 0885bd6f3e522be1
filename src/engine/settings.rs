use std::env;

use tracing::debug;

pub const DEFAULT_CHANNEL_GROUP: &str = "configator";
pub const DEFAULT_ENV_PREFIX: &str = "CONFIGATOR";

pub const DEFAULT_REDIS_HOST: &str = "localhost";
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Constructor-supplied connection options. Every field is optional;
/// whatever is left unset falls back to environment variables and then
/// to the defaults above.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db: Option<i64>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub channel_group: Option<String>,
    pub env_prefix: Option<String>,
}

/// Resolved connection parameters. Built once, immutable afterwards.
///
/// Resolution order per field:
/// 1. `{PREFIX}_REDIS_*` environment variable, if present and parseable
///    (host always wins over the constructor value; port must be a
///    positive integer, db an integer, otherwise the env value is ignored)
/// 2. constructor option
/// 3. default (localhost / 6379 / db 0)
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub username: Option<String>,
    pub password: Option<String>,
    pub channel_group: String,
    pub env_prefix: String,
}

impl ConnectionSettings {
    pub fn build(opts: ConnectionOptions) -> Self {
        let channel_group = opts
            .channel_group
            .unwrap_or_else(|| DEFAULT_CHANNEL_GROUP.to_string());
        let env_prefix = opts
            .env_prefix
            .unwrap_or_else(|| DEFAULT_ENV_PREFIX.to_string());

        let var = |suffix: &str| env::var(format!("{env_prefix}_{suffix}")).ok();

        let host = var("REDIS_HOST")
            .filter(|h| !h.is_empty())
            .or(opts.host)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_REDIS_HOST.to_string());

        let port = var("REDIS_PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .filter(|p| *p > 0)
            .or(opts.port)
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_REDIS_PORT);

        let db = var("REDIS_DB")
            .and_then(|d| d.parse::<i64>().ok())
            .or(opts.db)
            .unwrap_or(0);

        let username = var("REDIS_USERNAME").or(opts.username);
        let password = var("REDIS_PASSWORD").or(opts.password);

        let settings = Self {
            host,
            port,
            db,
            username,
            password,
            channel_group,
            env_prefix,
        };

        debug!(
            host = %settings.host,
            port = settings.port,
            db = settings.db,
            username = ?settings.username,
            password_set = settings.password.is_some(),
            channel_group = %settings.channel_group,
            "resolved redis connection settings"
        );

        settings
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::build(ConnectionOptions::default())
    }
}
