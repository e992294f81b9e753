//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// Decode failures are expected at runtime (a server may send a frame the
/// client doesn't understand); callers above the transport drop them
/// instead of surfacing them.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown `type` tag, missing
    /// required fields, or wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value is well-formed but not valid protocol vocabulary,
    /// e.g. parsing `"lizard"` as a [`Choice`](crate::Choice).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
