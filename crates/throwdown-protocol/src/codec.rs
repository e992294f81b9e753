//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The transport doesn't care HOW messages are serialized; it is handed
//! something that implements [`Codec`] and uses it on both directions of
//! the socket.
//!
//! The match server speaks JSON text frames, so [`JsonCodec`] is the only
//! implementation today.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the transport's pump task owns a copy
/// of the codec for the lifetime of the connection.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// carry an unknown message tag, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use throwdown_protocol::{Choice, ClientMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let bytes = codec
///     .encode(&ClientMessage::Choice { choice: Choice::Rock })
///     .unwrap();
/// assert_eq!(bytes, br#"{"type":"choice","choice":"rock"}"#);
///
/// let decoded: ClientMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, ClientMessage::Choice { choice: Choice::Rock });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
