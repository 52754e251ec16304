//! Codec trait and the JSON implementation.
//!
//! The server only ever speaks JSON, but handlers are written against
//! [`Codec`] so tests can swap in a recording or failing codec.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to one frame of bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a frame.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] if the bytes are malformed or do not match
    /// the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`. Frames carry no trailing newline;
/// line framing is the transport's job.
///
/// ```rust
/// use noughts_protocol::{Codec, ErrorPayload, JsonCodec, ServerMessage};
///
/// let msg = ServerMessage::Error(ErrorPayload::new("not your turn"));
/// let bytes = JsonCodec.encode(&msg).unwrap();
/// assert_eq!(
///     std::str::from_utf8(&bytes).unwrap(),
///     r#"{"type":"ERROR","payload":{"message":"not your turn"}}"#,
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
