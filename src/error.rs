//! Error types for the relay core.

use crate::types::ConnId;
use thiserror::Error;

/// Why a raw subscription identifier was rejected.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("subscription id cannot be empty")]
    Empty,

    #[error("subscription id is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("invalid byte 0x{byte:02x} at position {position} in subscription id")]
    InvalidByte { byte: u8, position: usize },
}

/// Main error type for relay core operations.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdError),

    #[error("Connection {conn} already has {limit} subscriptions")]
    TooManySubscriptions { conn: ConnId, limit: usize },

    #[error("Unknown protocol verb: {0}")]
    UnknownVerb(String),

    #[error("Invalid metrics namespace: {0:?}")]
    InvalidNamespace(String),

    #[error("Metrics registry already installed")]
    MetricsAlreadyInstalled,
}

/// Result type for relay core operations.
pub type Result<T> = std::result::Result<T, RelayError>;
