// src/config/mod.rs

//! Plan loading and validation for the `seqrun` CLI.
//!
//! Responsibilities:
//! - Define the TOML-backed plan model (`model.rs`).
//! - Load a plan file from disk (`loader.rs`).
//! - Validate invariants like step shape and include acyclicity (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_PLAN_FILE, load_and_validate, load_from_path};
pub use model::{ConfigSection, PlanFile, RawPlanFile, SequenceConfig, StepConfig, StepKind};
