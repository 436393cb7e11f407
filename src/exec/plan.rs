// src/exec/plan.rs

//! Turn a validated plan into a ready-to-start [`Scheduler`].

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::{PlanFile, StepKind};
use crate::errors::{Result, SeqrunError};
use crate::exec::{command_step, fail_step};
use crate::scheduler::Scheduler;
use crate::sequence::Sequence;

/// Build every sequence of `plan` and register the runnable ones.
///
/// Sequences are built in include order, so an `include` step splices the
/// complete step list of its target. With `only`, just that sequence is
/// registered (it may be one marked `run = false`).
pub fn build_scheduler(plan: &PlanFile, only: Option<&str>) -> Result<Scheduler> {
    let capacity = plan.config().event_capacity;
    let mut built: HashMap<&str, Sequence> = HashMap::new();

    for name in plan.build_order() {
        let Some(seq_cfg) = plan.sequence(name) else {
            return Err(SeqrunError::UnknownSequence(name.clone()));
        };

        let sequence = Sequence::configured(Some(name.clone()), capacity);
        for step in seq_cfg.steps.iter() {
            let kind = step.kind().map_err(SeqrunError::ConfigError)?;
            match kind {
                StepKind::Delay(duration) => {
                    sequence.delay(duration);
                }
                StepKind::Cmd(cmd) => {
                    sequence.next(command_step(cmd));
                }
                StepKind::Fail(message) => {
                    sequence.next(fail_step(message));
                }
                StepKind::Include(target) => {
                    let included = built
                        .get(target)
                        .ok_or_else(|| SeqrunError::UnknownSequence(target.to_string()))?;
                    sequence.next(included);
                }
            }
        }

        debug!(sequence = %name, steps = sequence.len(), "sequence built");
        built.insert(name.as_str(), sequence);
    }

    let scheduler = Scheduler::with_event_capacity(capacity);
    let selected: Vec<&str> = match only {
        Some(name) => {
            if !built.contains_key(name) {
                return Err(SeqrunError::UnknownSequence(name.to_string()));
            }
            vec![name]
        }
        None => plan.runnable().collect(),
    };

    for name in selected {
        if let Some(sequence) = built.get(name) {
            scheduler.set(name, sequence);
        }
    }

    info!(sequences = scheduler.len(), names = ?scheduler.names(), "scheduler built from plan");
    Ok(scheduler)
}
