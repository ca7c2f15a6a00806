// src/config/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{PipelineFile, RawPipelineFile, TaskConfig};
use crate::errors::{Result, TaskGraphError};

impl TryFrom<RawPipelineFile> for PipelineFile {
    type Error = TaskGraphError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_pipeline(&raw)?;
        Ok(PipelineFile::new_unchecked(raw.config, raw.task))
    }
}

fn validate_raw_pipeline(cfg: &RawPipelineFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_root(cfg)?;
    validate_task_dependencies(cfg)?;
    topological_order(&cfg.task)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(TaskGraphError::ConfigError(
            "pipeline must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_root(cfg: &RawPipelineFile) -> Result<()> {
    if let Some(root) = &cfg.config.root {
        if !cfg.task.contains_key(root) {
            return Err(TaskGraphError::ConfigError(format!(
                "[config].root names unknown task '{root}'"
            )));
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawPipelineFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.dependency_names() {
            if dep == name.as_str() {
                return Err(TaskGraphError::ConfigError(format!(
                    "task '{name}' cannot depend on itself in `deps`"
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(TaskGraphError::ConfigError(format!(
                    "task '{name}' has unknown dependency '{dep}' in `deps`"
                )));
            }
        }
    }
    Ok(())
}

/// Task names ordered so every task comes after all of its dependencies.
///
/// Edge direction is dep -> task. Fails with `DagCycle` if no such order
/// exists.
pub fn topological_order(tasks: &BTreeMap<String, TaskConfig>) -> Result<Vec<String>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in tasks.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in tasks.iter() {
        for dep in task.dependency_names() {
            graph.add_edge(dep, name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(TaskGraphError::DagCycle(format!(
            "cycle detected in pipeline involving task '{}'",
            cycle.node_id()
        ))),
    }
}
