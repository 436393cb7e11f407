// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{PlanFile, RawPlanFile};
use crate::errors::Result;

/// Load a plan file from a given path and return the raw `RawPlanFile`.
///
/// This only performs TOML deserialization; it does **not** check includes
/// or step shapes. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPlanFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let plan: RawPlanFile = toml::from_str(&contents)?;
    debug!(path = ?path, sequences = plan.sequence.len(), "plan file parsed");

    Ok(plan)
}

/// Load a plan file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - at least one runnable sequence,
///   - steps with exactly one kind,
///   - unknown or self `include` references,
///   - include cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PlanFile> {
    let raw_plan = load_from_path(&path)?;
    let plan = PlanFile::try_from(raw_plan)?;
    Ok(plan)
}

/// Plan file looked up in the working directory when `--plan` is not given.
pub const DEFAULT_PLAN_FILE: &str = "Seqrun.toml";
