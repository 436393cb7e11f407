// src/logging.rs

//! `tracing-subscriber` setup for the `seqrun` binary.
//!
//! The filter comes from, in order:
//! 1. `--log-level`
//! 2. `SEQRUN_LOG`, which takes full `EnvFilter` directives
//!    (`debug`, `seqrun::sequence=trace,info`, ...)
//! 3. `info`
//!
//! Output goes to stderr; stdout carries dry-run output only.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "SEQRUN_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = resolve_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

/// Build the filter from the CLI flag and the raw `SEQRUN_LOG` value.
///
/// Unparseable env directives fall back to `info`.
pub fn resolve_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.as_str());
    }
    env.filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(LogLevel::Info.as_str()))
}
