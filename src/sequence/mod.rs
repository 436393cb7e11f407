// src/sequence/mod.rs

//! Strictly ordered runner of asynchronous steps.
//!
//! - [`state`] is the pure cursor/flags state machine.
//! - [`driver`] is the async loop that runs one step at a time.
//!
//! A [`Sequence`] is a cheap, cloneable handle: the clone held by a
//! scheduler and the one kept by the caller for chaining share one queue.

mod driver;
pub mod state;

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::events::{DEFAULT_EVENT_CAPACITY, Emitter, SequenceEvent};
use crate::step::{Enqueue, Step};
use crate::sync::lock;

pub use state::{Advance, SequenceState};

#[derive(Clone)]
pub struct Sequence {
    inner: Arc<SequenceInner>,
}

struct SequenceInner {
    name: Option<String>,
    state: Mutex<SequenceState>,
    events: Emitter<SequenceEvent>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::configured(None, DEFAULT_EVENT_CAPACITY)
    }

    /// A sequence whose name shows up in tracing output.
    pub fn named(name: impl Into<String>) -> Self {
        Self::configured(Some(name.into()), DEFAULT_EVENT_CAPACITY)
    }

    /// Full constructor; `event_capacity` sizes the broadcast buffer used by
    /// [`Sequence::subscribe`].
    pub fn configured(name: Option<String>, event_capacity: usize) -> Self {
        Self {
            inner: Arc::new(SequenceInner {
                name,
                state: Mutex::new(SequenceState::default()),
                events: Emitter::new(event_capacity),
            }),
        }
    }

    /// Append a step, a closure, or the pending steps of another sequence.
    ///
    /// Splicing a sequence copies its steps from its current cursor to its
    /// end as of this call; later changes to that sequence are not seen
    /// here, and its own cursor is left alone.
    pub fn next(&self, item: impl Enqueue) -> &Self {
        let steps = item.into_steps();
        debug!(sequence = %self.label(), added = steps.len(), "appending steps");
        lock(&self.inner.state).push(steps);
        self
    }

    /// Append a step that only waits for `duration`.
    pub fn delay(&self, duration: Duration) -> &Self {
        self.next(Step::delay(duration))
    }

    /// Begin or resume advancement on the next scheduling turn.
    ///
    /// On a current-thread runtime, listeners attached right after this call
    /// still observe every signal it produces. On a multi-thread runtime the
    /// loop may already be running; attach listeners first. Must be called
    /// from within a Tokio runtime.
    pub fn start(&self) -> &Self {
        tokio::spawn(driver::drive(self.clone()));
        self
    }

    /// Stop advancing once the step in flight (if any) completes.
    ///
    /// Emits `Stopped` immediately, before returning.
    pub fn stop(&self) -> &Self {
        lock(&self.inner.state).stop();
        info!(sequence = %self.label(), "sequence stop requested");
        self.inner.events.emit(SequenceEvent::Stopped);
        self
    }

    /// Register a listener called synchronously for every event.
    pub fn on<F>(&self, listener: F) -> &Self
    where
        F: Fn(&SequenceEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(listener);
        self
    }

    /// Receive events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SequenceEvent> {
        self.inner.events.subscribe()
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn position(&self) -> usize {
        lock(&self.inner.state).position()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.state).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of steps not yet executed.
    pub fn remaining(&self) -> usize {
        let state = lock(&self.inner.state);
        state.len() - state.position()
    }

    pub fn is_started(&self) -> bool {
        lock(&self.inner.state).is_started()
    }

    pub fn is_stopped(&self) -> bool {
        lock(&self.inner.state).is_stopped()
    }

    /// True while an advancement loop is active.
    pub fn is_running(&self) -> bool {
        lock(&self.inner.state).is_driving()
    }

    /// True once started, idle, and with the whole queue consumed.
    pub fn is_finished(&self) -> bool {
        let state = lock(&self.inner.state);
        state.is_started() && !state.is_driving() && state.position() == state.len()
    }

    pub(crate) fn pending_steps(&self) -> Vec<Step> {
        lock(&self.inner.state).pending()
    }

    fn label(&self) -> String {
        match &self.inner.name {
            Some(name) => name.clone(),
            None => format!("{:p}", Arc::as_ptr(&self.inner)),
        }
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("Sequence")
            .field("name", &self.inner.name)
            .field("position", &state.position())
            .field("len", &state.len())
            .field("started", &state.is_started())
            .field("stopped", &state.is_stopped())
            .finish_non_exhaustive()
    }
}

impl Enqueue for &Sequence {
    fn into_steps(self) -> Vec<Step> {
        self.pending_steps()
    }
}
