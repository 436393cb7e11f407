// src/sequence/state.rs

//! Pure state of a sequence.
//!
//! No Tokio types and no IO: the driver asks this state what to do next and
//! reports step outcomes back. Every transition happens under the
//! sequence's lock, and nothing here is held across an `.await`.

use crate::events::SequenceEvent;
use crate::step::Step;

/// What the driver should do after consulting the state.
#[derive(Debug)]
pub enum Advance {
    /// Run this step; it sits at `position` in the queue.
    Run { step: Step, position: usize },
    /// The cursor is at the end of the queue.
    Finished,
    /// `stop()` was called; halt without any further signal.
    Halted,
}

#[derive(Debug, Default)]
pub struct SequenceState {
    queue: Vec<Step>,
    /// Index of the next step to run; `position <= queue.len()`.
    position: usize,
    started: bool,
    stopped: bool,
    /// True while an advancement loop owns the cursor.
    driving: bool,
}

impl SequenceState {
    pub fn push(&mut self, steps: Vec<Step>) {
        self.queue.extend(steps);
    }

    /// Snapshot of the steps not yet executed, in order.
    pub fn pending(&self) -> Vec<Step> {
        self.queue[self.position..].to_vec()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_driving(&self) -> bool {
        self.driving
    }

    /// Entry of a deferred `start()`.
    ///
    /// Returns the signal to announce and whether the caller now owns the
    /// advancement loop. A second entry while a loop is active only
    /// announces progress.
    pub fn enter(&mut self) -> (SequenceEvent, bool) {
        let announce = if self.started {
            SequenceEvent::Progress {
                position: self.position,
                total: self.queue.len(),
            }
        } else {
            self.started = true;
            SequenceEvent::Started
        };

        if self.driving {
            return (announce, false);
        }
        self.driving = true;
        (announce, true)
    }

    /// Decide the next move of the advancement loop.
    ///
    /// The end-of-queue check reads the length right here, so a step pushed
    /// after `Finished` was returned is left for the next `start()`.
    pub fn next_action(&mut self) -> Advance {
        if self.stopped {
            self.driving = false;
            return Advance::Halted;
        }

        match self.queue.get(self.position) {
            Some(step) => Advance::Run {
                step: step.clone(),
                position: self.position,
            },
            None => {
                self.driving = false;
                Advance::Finished
            }
        }
    }

    /// Record a successful step. Returns whether the loop should continue.
    ///
    /// A step that completes after `stop()` leaves the cursor where it was.
    pub fn step_succeeded(&mut self) -> bool {
        if self.stopped {
            self.driving = false;
            return false;
        }
        self.position += 1;
        true
    }

    /// Record a failed step. The cursor stays on the failed step.
    pub fn step_failed(&mut self) {
        self.driving = false;
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }
}
