//! Copy-on-write listener list for inbound message fan-out.
//!
//! Dispatch takes a snapshot of the list (an `Arc` clone) and iterates the
//! snapshot without holding the lock, so a callback can add or remove
//! listeners, including itself, while a message is being delivered.
//! Changes apply from the next message on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Listener<M> = Arc<dyn Fn(&M) + Send + Sync>;

struct Registry<M> {
    next_id: AtomicU64,
    listeners: Mutex<Arc<Vec<(u64, Listener<M>)>>>,
}

impl<M> Registry<M> {
    fn lock(&self) -> MutexGuard<'_, Arc<Vec<(u64, Listener<M>)>>> {
        // A panicking listener never runs under this lock, so the list
        // itself can't be left half-updated.
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) -> bool {
        let mut guard = self.lock();
        if !guard.iter().any(|(lid, _)| *lid == id) {
            return false;
        }
        let remaining: Vec<_> = guard
            .iter()
            .filter(|(lid, _)| *lid != id)
            .cloned()
            .collect();
        *guard = Arc::new(remaining);
        true
    }
}

/// A set of callbacks that each receive every dispatched message, in
/// registration order.
pub struct ListenerRegistry<M> {
    inner: Arc<Registry<M>>,
}

impl<M> ListenerRegistry<M> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                listeners: Mutex::new(Arc::new(Vec::new())),
            }),
        }
    }

    /// Registers `callback` and returns the [`Subscription`] that removes
    /// exactly this callback again.
    pub fn add<F>(&self, callback: F) -> Subscription<M>
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.inner.lock();
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push((id, Arc::new(callback) as Listener<M>));
        *guard = Arc::new(next);

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers `message` to every listener registered when the call began.
    pub fn dispatch(&self, message: &M) {
        let snapshot = Arc::clone(&self.inner.lock());
        for (_, listener) in snapshot.iter() {
            listener(message);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M> Default for ListenerRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration of one listener. Dropping it (or calling
/// [`unsubscribe`](Self::unsubscribe)) removes the listener.
///
/// Holds only a weak reference to the registry: a subscription never keeps
/// a closed connection's listener list alive.
#[must_use = "dropping a Subscription removes the listener immediately"]
pub struct Subscription<M> {
    id: u64,
    registry: Weak<Registry<M>>,
}

impl<M> Subscription<M> {
    /// Removes the listener. Returns `false` if it was already gone.
    pub fn unsubscribe(mut self) -> bool {
        self.remove()
    }

    /// Returns `true` while the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|r| r.lock().iter().any(|(id, _)| *id == self.id))
    }

    fn remove(&mut self) -> bool {
        let registry = std::mem::take(&mut self.registry);
        registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id))
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        self.remove();
    }
}

impl<M> std::fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
