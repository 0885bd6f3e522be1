use redis::RedisError;

/// Crate-wide result type.
pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // =========
    // Config / startup
    // =========
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // =========
    // Broker connectivity
    // =========
    /// Broker unreachable or a liveness probe failed.
    /// This is the only class of error the connect loop retries.
    #[error("Broker connectivity error: {0}")]
    Connectivity(String),

    /// Any Redis failure that is not a connectivity problem
    /// (protocol errors, type errors, auth rejections, ...).
    /// Never retried; always propagates.
    #[error("Redis error: {0}")]
    Redis(RedisError),

    /// The manager was closed while a connect loop was still waiting.
    #[error("Connection manager is closed")]
    Closed,

    // =========
    // Publish contract
    // =========
    #[error("{0}")]
    Validation(String),

    #[error("Message serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Serialized payload is {got} bytes, limit is {limit}")]
    PayloadTooLarge { got: usize, limit: usize },
}

impl AppError {
    /// True for errors the connect loop is allowed to retry.
    #[inline]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, AppError::Connectivity(_))
    }
}

// Lets infallible message conversions (&str, i64, ...) flow through the
// same generic publish surface as fallible ones.
impl From<std::convert::Infallible> for AppError {
    fn from(x: std::convert::Infallible) -> Self {
        match x {}
    }
}

impl From<RedisError> for AppError {
    fn from(err: RedisError) -> Self {
        // redis-rs has no single "connection error" type; classify by kind.
        // Anything transport-shaped is retryable, the rest surfaces as-is.
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            AppError::Connectivity(err.to_string())
        } else {
            AppError::Redis(err)
        }
    }
}
