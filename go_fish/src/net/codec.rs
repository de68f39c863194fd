use super::{
    errors::{Result, SerializationError},
    messages::WireMessage,
};

/// Maximum allowed message size (1MB) to prevent unbounded allocation
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

pub fn encode(message: &WireMessage) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(message).map_err(SerializationError::Encode)?;
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(SerializationError::MessageTooLarge {
            actual: bytes.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(bytes)
}

/// Decodes a whole message or nothing. Oversized payloads are rejected
/// before parsing.
pub fn decode(bytes: &[u8]) -> Result<WireMessage> {
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(SerializationError::MessageTooLarge {
            actual: bytes.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    serde_json::from_slice(bytes).map_err(SerializationError::Decode)
}
