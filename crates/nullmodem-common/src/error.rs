//! Common error types for nullmodem components.

use thiserror::Error;

/// Setup message encode/decode errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Payload longer than the inbound bound
    #[error("Payload too long: {len} bytes (max {max})")]
    Oversized { len: usize, max: usize },

    /// Payload does not match `ID<digits>_<digits>`
    #[error("Malformed setup message")]
    Malformed,

    /// Id does not fit in the six-digit wire field
    #[error("Id {0} does not fit in six digits")]
    IdOutOfRange(u32),
}

/// Common errors across nullmodem components
#[derive(Debug, Error)]
pub enum NullModemError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local socket could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Peer address could not be resolved
    #[error("Failed to resolve address {0}")]
    Resolve(String),

    /// Transport I/O error
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Setup message codec error
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl NullModemError {
    /// Returns true if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result alias for nullmodem operations
pub type Result<T> = std::result::Result<T, NullModemError>;
