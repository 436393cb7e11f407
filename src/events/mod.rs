// src/events/mod.rs

//! Lifecycle events emitted by sequences and schedulers.
//!
//! - [`emitter`] holds the [`Emitter`] used by both: synchronous listeners
//!   registered with `on`, plus a broadcast channel for async subscribers.

pub mod emitter;

pub use emitter::{Emitter, Listener};

use crate::step::StepError;

/// Broadcast buffer used when no capacity is configured.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Signals emitted by a [`Sequence`](crate::Sequence).
#[derive(Debug, Clone)]
pub enum SequenceEvent {
    /// First advancement attempt of this sequence.
    Started,
    /// A later `start()` call resumed (or re-entered) the sequence.
    Progress { position: usize, total: usize },
    /// The cursor reached the end of the queue.
    Finished,
    /// `stop()` was called.
    Stopped,
    /// A step failed; the sequence halted at that step.
    Error(StepError),
}

/// Signals emitted by a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    Started,
    /// Every registered sequence has finished.
    Finished,
    Stopped,
    /// First failure reported by any registered sequence, forwarded as-is.
    Error(StepError),
}

impl SequenceEvent {
    pub fn is_finished(&self) -> bool {
        matches!(self, SequenceEvent::Finished)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SequenceEvent::Error(_))
    }
}

impl SchedulerEvent {
    pub fn is_finished(&self) -> bool {
        matches!(self, SchedulerEvent::Finished)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SchedulerEvent::Error(_))
    }
}
