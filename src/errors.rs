// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::step::StepError;

#[derive(Error, Debug)]
pub enum SeqrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Sequence not found: {0}")]
    UnknownSequence(String),

    #[error("Include cycle detected: {0}")]
    IncludeCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Step failed: {0}")]
    StepFailed(StepError),

    #[error("Scheduler stopped before all sequences finished")]
    Stopped,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SeqrunError>;
