// src/lib.rs

//! Ordered and concurrent runners for asynchronous steps.
//!
//! - [`Sequence`] runs a growable queue of steps strictly one after another.
//! - [`Scheduler`] runs many sequences concurrently and reports when all of
//!   them finished, or the moment one failed.
//!
//! ```no_run
//! use std::time::Duration;
//! use seqrun::{Scheduler, Sequence};
//!
//! # async fn demo() -> seqrun::errors::Result<()> {
//! let fetch = Sequence::named("fetch");
//! fetch
//!     .delay(Duration::from_millis(100))
//!     .next(|| async { anyhow::Ok(()) });
//!
//! let scheduler = Scheduler::new();
//! scheduler.set("fetch", &fetch);
//! scheduler.run().await
//! # }
//! ```
//!
//! The `seqrun` binary drives the same types from a TOML plan.

pub mod cli;
pub mod config;
pub mod errors;
pub mod events;
pub mod exec;
pub mod logging;
pub mod scheduler;
pub mod sequence;
pub mod step;
mod sync;
pub mod types;

pub use events::{SchedulerEvent, SequenceEvent};
pub use scheduler::Scheduler;
pub use sequence::Sequence;
pub use step::{Enqueue, Step, StepError, StepFuture};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{PlanFile, StepKind, load_and_validate};
use crate::errors::SeqrunError;
use crate::exec::build_scheduler;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - plan loading
/// - scheduler construction
/// - Ctrl-C handling and the optional `stop_after` timer
pub async fn run(args: CliArgs) -> Result<()> {
    let plan = load_and_validate(&args.plan)
        .with_context(|| format!("loading plan {}", args.plan.display()))?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(());
    }

    let scheduler = build_scheduler(&plan, args.only.as_deref())?;

    // Ctrl-C → graceful stop.
    {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                return;
            }
            info!("Ctrl-C received; stopping scheduler");
            scheduler.stop();
        });
    }

    if let Some(after) = plan.config().stop_after {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after.as_duration()).await;
            info!(after = %after, "stop_after elapsed; stopping scheduler");
            scheduler.stop();
        });
    }

    match scheduler.run().await {
        Ok(()) => {
            info!("all sequences finished");
            Ok(())
        }
        Err(SeqrunError::Stopped) => {
            warn!(
                completed = scheduler.completed(),
                total = scheduler.len(),
                "scheduler stopped before all sequences finished"
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Simple dry-run output: print sequences and their steps.
fn print_dry_run(plan: &PlanFile) {
    println!("seqrun dry-run");
    println!("  config.event_capacity = {}", plan.config().event_capacity);
    if let Some(after) = plan.config().stop_after {
        println!("  config.stop_after = {after}");
    }
    println!();

    println!("sequences ({}):", plan.sequences().len());
    for (name, seq) in plan.sequences().iter() {
        let suffix = if seq.run { "" } else { " (include only)" };
        println!("  - {name}{suffix}");
        for step in seq.steps.iter() {
            match step.kind() {
                Ok(StepKind::Delay(d)) => println!("      delay: {d:?}"),
                Ok(StepKind::Cmd(cmd)) => println!("      cmd: {cmd}"),
                Ok(StepKind::Fail(msg)) => println!("      fail: {msg}"),
                Ok(StepKind::Include(target)) => println!("      include: {target}"),
                Err(msg) => println!("      invalid: {msg}"),
            }
        }
    }
    println!();
    println!("build order: {:?}", plan.build_order());
}
