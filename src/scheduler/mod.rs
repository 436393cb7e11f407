// src/scheduler/mod.rs

//! Concurrent runner and aggregator of sequences.
//!
//! A [`Scheduler`] starts and stops every registered [`Sequence`] and turns
//! their individual signals into one lifecycle:
//! - `Error` as soon as any sequence fails (siblings keep running),
//! - `Finished` once every sequence has finished.
//!
//! Bookkeeping lives in [`tracker`]; this module wires it to the events.

pub mod tracker;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::errors::{Result, SeqrunError};
use crate::events::{DEFAULT_EVENT_CAPACITY, Emitter, SchedulerEvent, SequenceEvent};
use crate::sequence::Sequence;
use crate::step::StepError;
use crate::sync::lock;

pub use tracker::CompletionTracker;

#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    state: Mutex<SchedulerState>,
    events: Emitter<SchedulerEvent>,
}

#[derive(Default)]
struct SchedulerState {
    sequences: Vec<Sequence>,
    named: BTreeMap<String, Sequence>,
    tracker: CompletionTracker,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(event_capacity: usize) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                state: Mutex::new(SchedulerState::default()),
                events: Emitter::new(event_capacity),
            }),
        }
    }

    /// Register a sequence. Register everything before calling `start`.
    ///
    /// The scheduler listens to the sequence through a weak reference, so a
    /// sequence outliving its scheduler keeps no scheduler state alive.
    ///
    /// Only the first failure among registered sequences is emitted as the
    /// scheduler's `Error`. Later failures are logged; observe them on the
    /// sequence itself.
    pub fn add(&self, sequence: &Sequence) -> &Self {
        let slot = {
            let mut state = lock(&self.inner.state);
            state.sequences.push(sequence.clone());
            state.tracker.register()
        };

        let weak: Weak<SchedulerInner> = Arc::downgrade(&self.inner);
        sequence.on(move |event| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match event {
                SequenceEvent::Error(reason) => inner.sequence_failed(slot, reason.clone()),
                SequenceEvent::Finished => inner.sequence_finished(slot),
                _ => {}
            }
        });

        debug!(slot, sequence = ?sequence.name(), "sequence registered");
        self
    }

    /// Register a sequence and expose it under `name`.
    ///
    /// Re-using a name only replaces the lookup entry; the earlier sequence
    /// stays registered.
    pub fn set(&self, name: impl Into<String>, sequence: &Sequence) -> &Self {
        self.add(sequence);
        let name = name.into();
        if lock(&self.inner.state)
            .named
            .insert(name.clone(), sequence.clone())
            .is_some()
        {
            warn!(name = %name, "named sequence replaced; previous one stays registered");
        }
        self
    }

    /// Look up a sequence registered with [`Scheduler::set`].
    pub fn get(&self, name: &str) -> Option<Sequence> {
        lock(&self.inner.state).named.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        lock(&self.inner.state).named.keys().cloned().collect()
    }

    pub fn sequences(&self) -> Vec<Sequence> {
        lock(&self.inner.state).sequences.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.state).sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once any registered sequence has failed.
    pub fn has_failed(&self) -> bool {
        lock(&self.inner.state).tracker.has_failed()
    }

    /// Number of distinct sequences that have finished.
    pub fn completed(&self) -> usize {
        lock(&self.inner.state).tracker.completed()
    }

    /// Start every registered sequence on the next scheduling turn.
    ///
    /// Emits `Started`, then `Finished` right away when nothing is
    /// registered. Listeners attached right after this call see `Started`
    /// only on a current-thread runtime. Must be called from within a Tokio
    /// runtime.
    pub fn start(&self) -> &Self {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.start_all() });
        self
    }

    /// Stop every registered sequence on the next scheduling turn, then
    /// emit `Stopped`. Does not wait for in-flight steps. As with `start`,
    /// the deferral is only observable on a current-thread runtime.
    pub fn stop(&self) -> &Self {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.stop_all() });
        self
    }

    pub fn on<F>(&self, listener: F) -> &Self
    where
        F: Fn(&SchedulerEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(listener);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.inner.events.subscribe()
    }

    /// Start the scheduler and wait for its outcome.
    ///
    /// Resolves with `Ok(())` on `Finished`, [`SeqrunError::StepFailed`] on
    /// the first failure, and [`SeqrunError::Stopped`] on `Stopped`.
    pub async fn run(&self) -> Result<()> {
        let mut rx = self.subscribe();
        self.start();

        loop {
            match rx.recv().await {
                Ok(SchedulerEvent::Started) => {
                    debug!("scheduler run observed start");
                }
                Ok(SchedulerEvent::Finished) => return Ok(()),
                Ok(SchedulerEvent::Error(reason)) => return Err(SeqrunError::StepFailed(reason)),
                Ok(SchedulerEvent::Stopped) => return Err(SeqrunError::Stopped),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "scheduler run lagged behind its events");
                }
                Err(RecvError::Closed) => {
                    return Err(anyhow::anyhow!("scheduler event channel closed").into());
                }
            }
        }
    }
}

impl SchedulerInner {
    fn start_all(self: &Arc<Self>) {
        info!("scheduler starting");
        self.events.emit(SchedulerEvent::Started);

        let (sequences, done_now) = {
            let mut state = lock(&self.state);
            let done_now = state.sequences.is_empty() && state.tracker.try_complete();
            (state.sequences.clone(), done_now)
        };

        if done_now {
            info!("scheduler has no sequences; finished");
            self.events.emit(SchedulerEvent::Finished);
            return;
        }

        for sequence in &sequences {
            sequence.start();
        }
    }

    fn stop_all(self: &Arc<Self>) {
        let sequences = lock(&self.state).sequences.clone();
        for sequence in &sequences {
            sequence.stop();
        }
        info!(count = sequences.len(), "scheduler stopped");
        self.events.emit(SchedulerEvent::Stopped);
    }

    fn sequence_failed(self: &Arc<Self>, slot: usize, reason: StepError) {
        let first = lock(&self.state).tracker.record_failure();
        if first {
            warn!(slot, error = %reason, "sequence failed; scheduler failing");
            self.events.emit(SchedulerEvent::Error(reason));
        } else {
            warn!(slot, error = %reason, "further sequence failure after scheduler already failed");
        }
    }

    fn sequence_finished(self: &Arc<Self>, slot: usize) {
        let (all_done, completed, total) = {
            let mut state = lock(&self.state);
            let all_done = state.tracker.record_finished(slot);
            (all_done, state.tracker.completed(), state.tracker.len())
        };
        debug!(slot, completed, total, "sequence finished");

        if all_done {
            // Emit after the finishing sequence's own listeners have run.
            let inner = Arc::clone(self);
            tokio::spawn(async move {
                info!(total, "all sequences finished");
                inner.events.emit(SchedulerEvent::Finished);
            });
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("Scheduler")
            .field("sequences", &state.sequences.len())
            .field("named", &state.named.keys().collect::<Vec<_>>())
            .field("tracker", &state.tracker)
            .finish()
    }
}
