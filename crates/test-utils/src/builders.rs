#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use seqrun::config::{ConfigSection, PlanFile, RawPlanFile, SequenceConfig, StepConfig};
use seqrun::errors::Result;

/// Builder for `PlanFile` to simplify test setup.
pub struct PlanBuilder {
    plan: RawPlanFile,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self {
            plan: RawPlanFile {
                config: ConfigSection::default(),
                sequence: BTreeMap::new(),
            },
        }
    }

    pub fn with_sequence(mut self, name: &str, sequence: SequenceConfig) -> Self {
        self.plan.sequence.insert(name.to_string(), sequence);
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.plan.config.event_capacity = capacity;
        self
    }

    pub fn with_stop_after(mut self, after: Duration) -> Self {
        self.plan.config.stop_after = Some(after.into());
        self
    }

    /// Validate and build; use when the plan is expected to be valid.
    pub fn build(self) -> PlanFile {
        PlanFile::try_from(self.plan).expect("Failed to build valid plan from builder")
    }

    /// Validate and return the outcome, for tests exercising validation.
    pub fn try_build(self) -> Result<PlanFile> {
        PlanFile::try_from(self.plan)
    }

    pub fn raw(self) -> RawPlanFile {
        self.plan
    }
}

impl Default for PlanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `SequenceConfig`.
pub struct SequenceConfigBuilder {
    sequence: SequenceConfig,
}

impl SequenceConfigBuilder {
    pub fn new() -> Self {
        Self {
            sequence: SequenceConfig::default(),
        }
    }

    pub fn run(mut self, val: bool) -> Self {
        self.sequence.run = val;
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.sequence
            .steps
            .push(StepConfig::delay(Duration::from_millis(ms)));
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.sequence.steps.push(StepConfig::cmd(cmd));
        self
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.sequence.steps.push(StepConfig::fail(message));
        self
    }

    pub fn include(mut self, target: &str) -> Self {
        self.sequence.steps.push(StepConfig::include(target));
        self
    }

    pub fn step(mut self, step: StepConfig) -> Self {
        self.sequence.steps.push(step);
        self
    }

    pub fn build(self) -> SequenceConfig {
        self.sequence
    }
}

impl Default for SequenceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
