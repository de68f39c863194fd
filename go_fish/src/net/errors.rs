//! Network error types for serialization and transport operations.

use thiserror::Error;

/// Errors that can occur during wire message serialization/deserialization
#[derive(Debug, Error)]
pub enum SerializationError {
    /// Failed to encode a message
    #[error("Failed to encode message: {0}")]
    Encode(serde_json::Error),

    /// Failed to decode a message
    #[error("Failed to decode message: {0}")]
    Decode(serde_json::Error),

    /// Message size exceeded maximum allowed
    #[error("Message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },
}

/// Errors surfaced by a transport when handing bytes off for delivery.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,

    #[error("delivery failed for {failed} of {total} peers")]
    PartialDelivery { failed: usize, total: usize },
}

/// Result type for serialization operations
pub type Result<T> = std::result::Result<T, SerializationError>;
