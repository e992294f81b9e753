//! Unified error type for the Throwdown client.

use throwdown_protocol::ProtocolError;
use throwdown_session::SessionError;
use throwdown_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Only setup can fail: loading config and connecting. Once a client is
/// running, problems show up in the published state or the connectivity
/// flag instead.
#[derive(Debug, thiserror::Error)]
pub enum ThrowdownError {
    /// A transport-level error (no identity, bad endpoint, dial failure).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (identity not resolved yet).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    Config(String),
}
