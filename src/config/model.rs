// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::types::HumanDuration;

/// Plan as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// event_capacity = 64
/// stop_after = "10s"
///
/// [sequence.build]
/// steps = [{ delay = "100ms" }, { cmd = "echo build" }, { include = "lint" }]
///
/// [sequence.lint]
/// run = false
/// steps = [{ cmd = "echo lint" }]
/// ```
///
/// All sections are optional at this stage; [`PlanFile::try_from`] enforces
/// the semantic rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPlanFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All sequences from `[sequence.<name>]`, keyed by name.
    #[serde(default)]
    pub sequence: BTreeMap<String, SequenceConfig>,
}

/// A validated plan.
///
/// Only obtainable through `TryFrom<RawPlanFile>`, which also computes the
/// order in which sequences must be built so every `include` refers to an
/// already built sequence.
#[derive(Debug, Clone)]
pub struct PlanFile {
    config: ConfigSection,
    sequence: BTreeMap<String, SequenceConfig>,
    build_order: Vec<String>,
}

impl PlanFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        sequence: BTreeMap<String, SequenceConfig>,
        build_order: Vec<String>,
    ) -> Self {
        Self {
            config,
            sequence,
            build_order,
        }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn sequences(&self) -> &BTreeMap<String, SequenceConfig> {
        &self.sequence
    }

    pub fn sequence(&self, name: &str) -> Option<&SequenceConfig> {
        self.sequence.get(name)
    }

    /// Sequence names with every include target ahead of its includers.
    pub fn build_order(&self) -> &[String] {
        &self.build_order
    }

    /// Names of sequences registered on the scheduler (`run = true`).
    pub fn runnable(&self) -> impl Iterator<Item = &str> {
        self.sequence
            .iter()
            .filter(|(_, seq)| seq.run)
            .map(|(name, _)| name.as_str())
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Broadcast buffer size for every sequence and the scheduler.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Stop the scheduler after this long, if set.
    #[serde(default)]
    pub stop_after: Option<HumanDuration>,
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            stop_after: None,
        }
    }
}

/// `[sequence.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceConfig {
    /// Register this sequence on the scheduler. Sequences with `run = false`
    /// only exist to be included by others.
    #[serde(default = "default_run")]
    pub run: bool,

    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

fn default_run() -> bool {
    true
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            run: default_run(),
            steps: Vec::new(),
        }
    }
}

/// One entry of `steps = [...]`. Exactly one field must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    /// Wait this long.
    #[serde(default)]
    pub delay: Option<HumanDuration>,

    /// Run a shell command; a non-zero exit fails the step.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Fail with this message.
    #[serde(default)]
    pub fail: Option<String>,

    /// Splice the pending steps of another sequence of the plan.
    #[serde(default)]
    pub include: Option<String>,
}

/// Resolved view of a [`StepConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind<'a> {
    Delay(Duration),
    Cmd(&'a str),
    Fail(&'a str),
    Include(&'a str),
}

impl StepConfig {
    pub fn delay(duration: Duration) -> Self {
        Self {
            delay: Some(duration.into()),
            ..Self::default()
        }
    }

    pub fn cmd(cmd: impl Into<String>) -> Self {
        Self {
            cmd: Some(cmd.into()),
            ..Self::default()
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            fail: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn include(sequence: impl Into<String>) -> Self {
        Self {
            include: Some(sequence.into()),
            ..Self::default()
        }
    }

    /// The single kind this entry describes, or a message naming the
    /// problem when zero or several fields are set.
    pub fn kind(&self) -> Result<StepKind<'_>, String> {
        let mut kinds = Vec::with_capacity(1);
        if let Some(d) = self.delay {
            kinds.push(StepKind::Delay(d.as_duration()));
        }
        if let Some(ref cmd) = self.cmd {
            kinds.push(StepKind::Cmd(cmd));
        }
        if let Some(ref msg) = self.fail {
            kinds.push(StepKind::Fail(msg));
        }
        if let Some(ref target) = self.include {
            kinds.push(StepKind::Include(target));
        }

        match kinds.as_slice() {
            [kind] => Ok(*kind),
            [] => Err("step must set one of `delay`, `cmd`, `fail`, `include`".to_string()),
            _ => Err(format!(
                "step sets {} kinds; expected exactly one of `delay`, `cmd`, `fail`, `include`",
                kinds.len()
            )),
        }
    }
}
