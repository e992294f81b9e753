//! Client transport layer for Throwdown.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! how bytes reach the match server, and the [`ConnectionHandle`] that the
//! rest of the client talks to:
//!
//! - `ConnectionHandle::open`: connect (or refuse to, without an identity)
//! - `ConnectionHandle::send`: encode and transmit while open, drop otherwise
//! - `ConnectionHandle::add_listener`: fan inbound messages out to callbacks
//! - `ConnectionHandle::close`: idempotent teardown
//!
//! The transport knows how to frame and decode messages but nothing about
//! what they mean.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod handle;
mod listeners;
mod memory;
mod params;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use handle::ConnectionHandle;
pub use listeners::{ListenerRegistry, Subscription};
pub use memory::MemoryConnection;
pub use params::ConnectParams;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opens outbound connections to a URL.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Connects to `url` and completes any protocol handshake.
    ///
    /// A returned connection is open.
    fn connect(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;
}

/// A single open connection that can send and receive frames.
///
/// The handle's pump task races `recv` against outgoing frames and
/// shutdown, so `recv` must be cancel-safe: dropping the future before it
/// completes must not lose a frame.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    fn send(
        &self,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }
}
