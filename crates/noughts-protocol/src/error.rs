//! Error types for the protocol layer.

/// Errors raised while turning envelopes into bytes and back.
///
/// A decode failure is never fatal to a connection: the caller drops the
/// offending line and keeps reading.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The bytes were not a well-formed envelope.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The envelope parsed but names a type this server does not handle.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// The payload did not match the shape its type requires.
    #[error("invalid payload for {kind}: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
