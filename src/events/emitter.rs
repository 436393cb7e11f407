// src/events/emitter.rs

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::sync::lock;

/// Callback invoked synchronously for every emitted event.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Event fan-out shared by sequences and schedulers.
///
/// Listeners run synchronously, in registration order, on whichever task
/// emits the event. Broadcast subscribers only receive events sent after
/// they subscribed; a slow subscriber observes `RecvError::Lagged` once the
/// buffer overflows. Listeners never lag.
pub struct Emitter<E> {
    listeners: Mutex<Vec<Listener<E>>>,
    tx: broadcast::Sender<E>,
}

impl<E: Clone + Send + 'static> Emitter<E> {
    /// Create an emitter with the given broadcast capacity (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            listeners: Mutex::new(Vec::new()),
            tx,
        }
    }

    pub fn on<F>(&self, listener: F)
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        lock(&self.listeners).push(Arc::new(listener));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    /// Deliver `event` to every listener, then to every subscriber.
    ///
    /// The listener list is cloned first so a listener may register further
    /// listeners (or emit on another emitter) without deadlocking.
    pub fn emit(&self, event: E) {
        let listeners = lock(&self.listeners).clone();
        for listener in &listeners {
            listener(&event);
        }
        let _ = self.tx.send(event);
    }
}

impl<E> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &lock(&self.listeners).len())
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}
