// src/scheduler/tracker.rs

//! Completion bookkeeping for a scheduler.

/// Counts distinct finished sequences and guards the scheduler's one-shot
/// signals.
///
/// Each registered sequence gets a slot. A slot is counted the first time
/// its sequence finishes; later `Finished` signals from the same sequence
/// (after a re-start) are ignored, so `completed` can never overshoot.
#[derive(Debug, Default)]
pub struct CompletionTracker {
    finished: Vec<bool>,
    completed: usize,
    finish_emitted: bool,
    failed: bool,
}

impl CompletionTracker {
    /// Reserve a slot for a newly registered sequence.
    pub fn register(&mut self) -> usize {
        self.finished.push(false);
        self.finished.len() - 1
    }

    pub fn len(&self) -> usize {
        self.finished.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finished.is_empty()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Record that the sequence in `slot` finished.
    ///
    /// Returns `true` exactly once: when this completes the whole set.
    pub fn record_finished(&mut self, slot: usize) -> bool {
        match self.finished.get_mut(slot) {
            Some(done) if !*done => {
                *done = true;
                self.completed += 1;
            }
            _ => return false,
        }
        self.try_complete()
    }

    /// Returns `true` if every slot is done and the aggregate `Finished` has
    /// not been claimed yet. With zero slots this holds immediately.
    pub fn try_complete(&mut self) -> bool {
        if self.finish_emitted || self.completed != self.finished.len() {
            return false;
        }
        self.finish_emitted = true;
        true
    }

    /// Record a sequence failure. Returns `true` only for the first one.
    pub fn record_failure(&mut self) -> bool {
        !std::mem::replace(&mut self.failed, true)
    }
}
