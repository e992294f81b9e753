/// Errors that can occur in the transport layer.
///
/// Only connection setup reports errors to callers. Once a
/// [`ConnectionHandle`](crate::ConnectionHandle) exists, failures show up
/// as the connectivity flag going false.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No identity token was supplied and anonymous connections were not
    /// allowed, so no connection was attempted.
    #[error("no identity token and anonymous connections are not allowed")]
    IdentityRequired,

    /// The endpoint is not a `ws://` or `wss://` URL.
    #[error("invalid endpoint {0:?}: expected a ws:// or wss:// URL")]
    InvalidEndpoint(String),

    /// Opening the connection failed (DNS, TCP, TLS, or the upgrade).
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
