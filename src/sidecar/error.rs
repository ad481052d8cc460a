use thiserror::Error;

/// Failures talking to the sidecar runtime or one of its backing components.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sidecar responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Broker error: {0}")]
    Broker(String),
}
