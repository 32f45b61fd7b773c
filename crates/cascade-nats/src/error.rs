//! NATS error types.

use thiserror::Error;

/// Result type for NATS operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur against the NATS cluster.
#[derive(Debug, Error)]
pub enum Error {
    /// Connecting to the cluster failed.
    #[error("NATS connection error: {0}")]
    Connection(String),

    /// A payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A JetStream operation failed.
    #[error("NATS {operation} failed: {message}")]
    Operation {
        /// What was being attempted.
        operation: &'static str,
        /// Broker-reported failure.
        message: String,
    },
}

impl Error {
    /// Creates an operation error.
    pub fn operation(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Operation {
            operation,
            message: message.into(),
        }
    }
}
