// src/sequence/driver.rs

//! Advancement loop of a sequence.

use tracing::{debug, info, warn};

use crate::events::SequenceEvent;
use crate::sequence::Sequence;
use crate::sequence::state::Advance;
use crate::step::{Step, StepError};
use crate::sync::lock;

/// Body of the task spawned by [`Sequence::start`].
///
/// Announces `Started`/`Progress`, then runs queued steps one at a time
/// until the queue is exhausted, a step fails, or the sequence is stopped.
/// Only one loop drives a sequence at a time; a re-entrant call returns
/// right after its announcement.
pub(super) async fn drive(sequence: Sequence) {
    let name = sequence.label();
    let (announce, owns_loop) = lock(&sequence.inner.state).enter();
    sequence.inner.events.emit(announce);

    if !owns_loop {
        debug!(sequence = %name, "advancement already in progress; not starting another loop");
        return;
    }

    loop {
        let action = lock(&sequence.inner.state).next_action();

        match action {
            Advance::Halted => {
                debug!(sequence = %name, "sequence stopped; halting advancement");
                return;
            }
            Advance::Finished => {
                info!(sequence = %name, "sequence finished");
                sequence.inner.events.emit(SequenceEvent::Finished);
                return;
            }
            Advance::Run { step, position } => {
                debug!(sequence = %name, position, step = step.label(), "running step");

                match run_step(step).await {
                    Ok(()) => {
                        if !lock(&sequence.inner.state).step_succeeded() {
                            debug!(
                                sequence = %name,
                                position,
                                "step completed after stop; not advancing further"
                            );
                            return;
                        }
                    }
                    Err(reason) => {
                        lock(&sequence.inner.state).step_failed();
                        warn!(sequence = %name, position, error = %reason, "step failed");
                        sequence.inner.events.emit(SequenceEvent::Error(reason));
                        return;
                    }
                }
            }
        }
    }
}

/// Run one step on its own task so a panicking producer or future turns
/// into a step failure instead of tearing down the loop.
async fn run_step(step: Step) -> Result<(), StepError> {
    match tokio::spawn(async move { step.invoke().await }).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(StepError::new(err)),
        Err(join_err) => Err(StepError::from_join(join_err)),
    }
}
