// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `seqrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "seqrun",
    version,
    about = "Run named sequences of steps concurrently from a TOML plan.",
    long_about = None
)]
pub struct CliArgs {
    /// Plan file to run.
    #[arg(long, short = 'p', value_name = "PATH", default_value = crate::config::DEFAULT_PLAN_FILE)]
    pub plan: PathBuf,

    /// Register only this sequence instead of every `run = true` sequence.
    #[arg(long, value_name = "NAME")]
    pub only: Option<String>,

    /// Overrides `SEQRUN_LOG`.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate and print the plan without running any step.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
