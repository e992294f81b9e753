//! The connection handle: one live (or defunct) socket and its listeners.
//!
//! A [`ConnectionHandle`] owns a background "pump" task that is the only
//! code touching the underlying [`Connection`]. The pump:
//!
//! 1. writes frames queued by [`ConnectionHandle::send`],
//! 2. reads inbound frames, decodes them with the codec, and fans each
//!    decoded message out to the registered listeners,
//! 3. closes the connection when asked to, when the handle is dropped, or
//!    when the remote end goes away.
//!
//! ```text
//!  send() ──mpsc──▶ ┌──────┐ ──frame──▶ server
//!                   │ pump │
//!  listeners ◀───── └──────┘ ◀──frame── server
//! ```
//!
//! Malformed frames never reach listeners; they are logged at debug level
//! and dropped. Nothing here reconnects: once closed, a handle stays
//! closed and a new one must be opened.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use throwdown_protocol::{Codec, JsonCodec};
use tokio::sync::{mpsc, watch, Notify};

use crate::{
    ConnectParams, Connection, ConnectionId, ListenerRegistry, Subscription,
    Transport, TransportError,
};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// State shared between the handle and its pump task.
struct Shared<In> {
    id: ConnectionId,
    open: AtomicBool,
    connected: watch::Sender<bool>,
    listeners: ListenerRegistry<In>,
    shutdown: Notify,
}

impl<In> Shared<In> {
    /// Flips the handle to closed. Returns `true` on the first call only.
    fn mark_closed(&self) -> bool {
        if self.open.swap(false, Ordering::SeqCst) {
            self.connected.send_replace(false);
            true
        } else {
            false
        }
    }
}

/// Exclusive owner of one connection to the match server.
///
/// `In` is the message type decoded from inbound frames, `Out` the type
/// encoded for outbound frames, and `K` the codec between them and bytes.
/// The handle is deliberately not `Clone`: there is at most one live
/// handle per session, and whoever holds it decides when it closes.
pub struct ConnectionHandle<In, Out, K: Codec = JsonCodec> {
    shared: Arc<Shared<In>>,
    outgoing: mpsc::UnboundedSender<Vec<u8>>,
    codec: K,
    _out: PhantomData<fn(&Out)>,
}

impl<In, Out, K> ConnectionHandle<In, Out, K>
where
    In: DeserializeOwned + Send + Sync + 'static,
    Out: Serialize,
    K: Codec + Clone,
{
    /// Opens a connection described by `params` through `transport`.
    ///
    /// Refuses to dial at all when `params` has no token and anonymous
    /// connections are not allowed.
    ///
    /// # Errors
    /// - [`TransportError::IdentityRequired`] / [`TransportError::InvalidEndpoint`]
    ///   from [`ConnectParams::url`]
    /// - whatever the transport reports if the connection can't be opened
    pub async fn open<T>(
        transport: &T,
        params: &ConnectParams,
        codec: K,
    ) -> Result<Self, TransportError>
    where
        T: Transport,
        TransportError: From<T::Error>,
    {
        let url = params.url()?;
        tracing::debug!(url = %params.redacted_url(), "connecting");
        let conn = transport.connect(&url).await?;
        let handle = Self::attach(conn, codec);
        tracing::info!(
            id = %handle.id(),
            url = %params.redacted_url(),
            anonymous = params.is_anonymous(),
            "connected to match server"
        );
        Ok(handle)
    }

    /// Wraps an already-open connection and starts its pump task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach<C: Connection>(conn: C, codec: K) -> Self {
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        let (connected, _) = watch::channel(true);
        let shared = Arc::new(Shared {
            id,
            open: AtomicBool::new(true),
            connected,
            listeners: ListenerRegistry::new(),
            shutdown: Notify::new(),
        });
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();

        tokio::spawn(pump(conn, Arc::clone(&shared), outgoing_rx, codec.clone()));

        Self {
            shared,
            outgoing,
            codec,
            _out: PhantomData,
        }
    }

    /// Encodes `message` and queues it for transmission.
    ///
    /// If the handle is closed the message is dropped without an error:
    /// callers must not assume delivery.
    pub fn send(&self, message: &Out) {
        if !self.is_connected() {
            tracing::debug!(id = %self.id(), "connection closed, dropping outbound message");
            return;
        }
        let frame = match self.codec.encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(id = %self.id(), error = %e, "failed to encode outbound message");
                return;
            }
        };
        if self.outgoing.send(frame).is_err() {
            tracing::debug!(id = %self.id(), "pump stopped, dropping outbound message");
        }
    }

    /// Registers a callback invoked once per decoded inbound message, in
    /// arrival order. Every listener receives every message.
    ///
    /// Callbacks run on the pump task and should hand work off quickly.
    pub fn add_listener<F>(&self, callback: F) -> Subscription<In>
    where
        F: Fn(&In) + Send + Sync + 'static,
    {
        self.shared.listeners.add(callback)
    }
}

impl<In, Out, K: Codec> ConnectionHandle<In, Out, K> {
    /// Closes the connection. Safe to call any number of times.
    pub fn close(&self) {
        if self.shared.mark_closed() {
            tracing::info!(id = %self.id(), "closing connection");
            self.shared.shutdown.notify_one();
        }
    }

    /// Returns `true` while the connection is open.
    pub fn is_connected(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// A receiver that observes the connectivity flag.
    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.shared.connected.subscribe()
    }

    /// Identifier of this connection, for logs.
    pub fn id(&self) -> ConnectionId {
        self.shared.id
    }
}

impl<In, Out, K: Codec> Drop for ConnectionHandle<In, Out, K> {
    fn drop(&mut self) {
        // The pump also notices the closed outgoing channel; this just
        // makes the flag flip immediately.
        self.close();
    }
}

/// Drives one connection until it closes.
async fn pump<C, In, K>(
    conn: C,
    shared: Arc<Shared<In>>,
    mut outgoing: mpsc::UnboundedReceiver<Vec<u8>>,
    codec: K,
) where
    C: Connection,
    In: DeserializeOwned + Send + Sync + 'static,
    K: Codec,
{
    let id = shared.id;
    loop {
        tokio::select! {
            biased;

            _ = shared.shutdown.notified() => {
                if let Err(e) = conn.close().await {
                    tracing::debug!(%id, error = %e, "close failed");
                }
                break;
            }

            frame = outgoing.recv() => match frame {
                Some(frame) => {
                    if let Err(e) = conn.send(frame).await {
                        tracing::warn!(%id, error = %e, "send failed, closing");
                        break;
                    }
                }
                None => {
                    // Handle dropped.
                    if let Err(e) = conn.close().await {
                        tracing::debug!(%id, error = %e, "close failed");
                    }
                    break;
                }
            },

            inbound = conn.recv() => match inbound {
                Ok(Some(bytes)) => match codec.decode::<In>(&bytes) {
                    Ok(message) => shared.listeners.dispatch(&message),
                    Err(e) => {
                        tracing::debug!(%id, error = %e, "dropping undecodable frame");
                    }
                },
                Ok(None) => {
                    tracing::info!(%id, "connection closed by server");
                    break;
                }
                Err(e) => {
                    tracing::warn!(%id, error = %e, "receive failed, closing");
                    break;
                }
            },
        }
    }

    shared.mark_closed();
    tracing::debug!(%id, "pump stopped");
}
