//! Save-request event bus
//!
//! Sub-plugins fire the `should-save` event to ask the lifecycle manager to
//! persist settings, without holding a reference to the manager or to the
//! storage backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Name of the single event carried by [`SaveRequestBus`]
pub const EVENT_SHOULD_SAVE: &str = "should-save";

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, Handler)>>,
}

impl BusInner {
    fn handlers(&self) -> MutexGuard<'_, Vec<(u64, Handler)>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cloneable handle to the `should-save` channel.
///
/// All clones share the same subscriber list.
#[derive(Clone, Default)]
pub struct SaveRequestBus {
    inner: Arc<BusInner>,
}

impl SaveRequestBus {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a zero-argument handler.
    ///
    /// The handler stays registered for as long as the returned
    /// [`Subscription`] is alive.
    pub fn on<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers().push((id, Arc::new(handler)));
        tracing::trace!(subscription = id, event = EVENT_SHOULD_SAVE, "Subscribed");
        Subscription {
            bus: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Invoke every current handler synchronously, in subscription order.
    ///
    /// Handlers run outside the subscriber lock, so a handler may subscribe
    /// or unsubscribe without deadlocking. No subscribers is a no-op.
    pub fn trigger(&self) {
        let snapshot: Vec<Handler> = self
            .inner
            .handlers()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        tracing::trace!(
            event = EVENT_SHOULD_SAVE,
            subscribers = snapshot.len(),
            "Triggering"
        );
        for handler in snapshot {
            handler();
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers().len()
    }
}

/// Disposable subscription handle. Dropping it revokes the handler.
#[must_use = "dropping a Subscription immediately unsubscribes its handler"]
pub struct Subscription {
    bus: Weak<BusInner>,
    id: u64,
}

impl Subscription {
    /// Revoke the handler now
    pub fn dispose(self) {}

    /// Whether the handler is still registered
    pub fn is_active(&self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|inner| inner.handlers().iter().any(|(id, _)| *id == self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            // Drop the handler after releasing the lock; it may own other subscriptions.
            let removed = {
                let mut handlers = inner.handlers();
                handlers
                    .iter()
                    .position(|(id, _)| *id == self.id)
                    .map(|index| handlers.remove(index))
            };
            drop(removed);
        }
    }
}
