//! In-process connection pair, for tests and local tooling.

use tokio::sync::{mpsc, Mutex};

use crate::{Connection, TransportError};

/// One end of an in-memory, bidirectional frame pipe.
///
/// Frames sent on one end arrive on the other in order. Closing (or
/// dropping) one end makes the other end's `recv` return `Ok(None)`,
/// the same as a clean WebSocket close.
pub struct MemoryConnection {
    tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl MemoryConnection {
    /// Creates two connected ends.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Mutex::new(Some(a_tx)),
                rx: Mutex::new(a_rx),
            },
            Self {
                tx: Mutex::new(Some(b_tx)),
                rx: Mutex::new(b_rx),
            },
        )
    }
}

impl Connection for MemoryConnection {
    type Error = TransportError;

    async fn send(&self, data: Vec<u8>) -> Result<(), Self::Error> {
        let guard = self.tx.lock().await;
        let tx = guard.as_ref().ok_or_else(|| {
            TransportError::ConnectionClosed("closed locally".into())
        })?;
        tx.send(data).map_err(|_| {
            TransportError::ConnectionClosed("peer dropped".into())
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.rx.lock().await.recv().await)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.tx.lock().await.take();
        Ok(())
    }
}
