// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{PlanFile, RawPlanFile, StepKind};
use crate::errors::{Result, SeqrunError};

impl TryFrom<RawPlanFile> for PlanFile {
    type Error = SeqrunError;

    fn try_from(raw: RawPlanFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_plan(&raw)?;
        let build_order = include_build_order(&raw)?;
        Ok(PlanFile::new_unchecked(raw.config, raw.sequence, build_order))
    }
}

fn validate_raw_plan(plan: &RawPlanFile) -> Result<()> {
    ensure_has_runnable_sequence(plan)?;
    validate_global_config(plan)?;
    validate_steps(plan)?;
    Ok(())
}

fn ensure_has_runnable_sequence(plan: &RawPlanFile) -> Result<()> {
    if !plan.sequence.values().any(|seq| seq.run) {
        return Err(SeqrunError::ConfigError(
            "plan must contain at least one [sequence.<name>] with run = true".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(plan: &RawPlanFile) -> Result<()> {
    if plan.config.event_capacity == 0 {
        return Err(SeqrunError::ConfigError(
            "[config].event_capacity must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_steps(plan: &RawPlanFile) -> Result<()> {
    for (name, seq) in plan.sequence.iter() {
        for (index, step) in seq.steps.iter().enumerate() {
            let kind = step.kind().map_err(|msg| {
                SeqrunError::ConfigError(format!("sequence '{}' step {}: {}", name, index, msg))
            })?;

            if let StepKind::Include(target) = kind {
                if target == name {
                    return Err(SeqrunError::ConfigError(format!(
                        "sequence '{}' cannot include itself",
                        name
                    )));
                }
                if !plan.sequence.contains_key(target) {
                    return Err(SeqrunError::UnknownSequence(format!(
                        "sequence '{}' includes unknown sequence '{}'",
                        name, target
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Topologically sort sequences by their includes.
///
/// Edge direction: included -> includer. For
///   [sequence.B]
///   steps = [{ include = "A" }]
/// we add edge A -> B, so A is built first.
fn include_build_order(plan: &RawPlanFile) -> Result<Vec<String>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in plan.sequence.keys() {
        graph.add_node(name.as_str());
    }

    for (name, seq) in plan.sequence.iter() {
        for step in seq.steps.iter() {
            if let Some(ref target) = step.include {
                graph.add_edge(target.as_str(), name.as_str(), ());
            }
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(SeqrunError::IncludeCycle(format!(
                "cycle detected in sequence includes involving sequence '{}'",
                node
            )))
        }
    }
}
