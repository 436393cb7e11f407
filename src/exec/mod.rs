// src/exec/mod.rs

//! Built-in step producers and plan execution.
//!
//! - [`command`] runs shell commands with `tokio::process::Command`.
//! - [`plan`] turns a validated plan into a [`Scheduler`](crate::Scheduler)
//!   of named sequences.

pub mod command;
pub mod plan;

pub use command::command_step;
pub use plan::build_scheduler;

use std::sync::Arc;

use crate::step::Step;

/// Build a step that always fails with `message`.
pub fn fail_step(message: impl Into<String>) -> Step {
    let message: String = message.into();
    let message: Arc<str> = Arc::from(message);
    let label = format!("fail({message})");

    Step::labelled(label, move || {
        let message = Arc::clone(&message);
        async move {
            let result: anyhow::Result<()> = Err(anyhow::anyhow!("{}", message));
            result
        }
    })
}
