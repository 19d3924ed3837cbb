//! Protocol client error types.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for protocol client operations.
pub type ProtoResult<T> = Result<T, ProtoError>;

/// Errors that can occur while talking to a memcached instance.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Peer unreachable, refused, or the connect attempt timed out.
    #[error("connection failed: {0}")]
    Connect(std::io::Error),

    /// No data arrived within the configured timeout.
    #[error("no data within {0:?}")]
    Timeout(Duration),

    /// Stream ended before the terminator, or the response was unusable.
    #[error("protocol error: {0}")]
    Protocol(String),
}
