// src/config/pipeline.rs

//! Turn a validated [`PipelineFile`] into runnable tasks.
//!
//! A configured task's resolver:
//! 1. sleeps `delay_ms` if set,
//! 2. fails with `fail` if set,
//! 3. otherwise returns `value` if set,
//! 4. otherwise passes its resolved dependency object through.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::anyhow;
use tracing::{debug, trace};

use crate::config::model::{DepSpec, PipelineFile, TaskConfig};
use crate::config::validate::topological_order;
use crate::errors::{Result, TaskGraphError};
use crate::task::{DepTree, Task, TaskBuilder};

/// Build one task per `[task.<name>]`, keyed by name.
///
/// Tasks are constructed in topological order so every dependency already
/// exists when its dependents are declared. All tasks share the file's
/// `[config].mode`.
pub fn build_tasks(cfg: &PipelineFile) -> Result<BTreeMap<String, Task>> {
    let builder = TaskBuilder::new().mode(cfg.config.mode);
    let mut built: BTreeMap<String, Task> = BTreeMap::new();

    for name in topological_order(&cfg.task)? {
        let task_cfg = cfg
            .task
            .get(&name)
            .ok_or_else(|| TaskGraphError::TaskNotFound(name.clone()))?;

        let deps = dep_tree(&task_cfg.deps, &built)?;
        let task = configured_task(&builder.name(name.as_str()).depend(deps), task_cfg);

        debug!(task = %name, id = %task.id(), "built configured task");
        built.insert(name, task);
    }

    Ok(built)
}

/// Pick the task a run should start from.
///
/// Priority: `override_root`, then `[config].root`, then the only task no
/// other task depends on.
pub fn resolve_root(cfg: &PipelineFile, override_root: Option<&str>) -> Result<String> {
    if let Some(name) = override_root {
        if !cfg.task.contains_key(name) {
            return Err(TaskGraphError::TaskNotFound(name.to_string()));
        }
        return Ok(name.to_string());
    }

    if let Some(name) = &cfg.config.root {
        return Ok(name.clone());
    }

    match cfg.sinks().as_slice() {
        [only] => Ok(only.to_string()),
        sinks => Err(TaskGraphError::ConfigError(format!(
            "no root given and the pipeline has {} candidate roots ({}); set [config].root or pass --root",
            sinks.len(),
            sinks.join(", ")
        ))),
    }
}

fn dep_tree(specs: &BTreeMap<String, DepSpec>, built: &BTreeMap<String, Task>) -> Result<DepTree> {
    let mut tree = DepTree::new();
    for (key, spec) in specs {
        tree = match spec {
            DepSpec::Task(name) => {
                let task = built
                    .get(name)
                    .ok_or_else(|| TaskGraphError::TaskNotFound(name.clone()))?;
                tree.with(key.as_str(), task)
            }
            DepSpec::Tree(children) => tree.with(key.as_str(), dep_tree(children, built)?),
        };
    }
    Ok(tree)
}

fn configured_task(builder: &TaskBuilder, cfg: &TaskConfig) -> Task {
    let value = cfg.value.clone();
    let fail = cfg.fail.clone();
    let delay = cfg.delay_ms.map(Duration::from_millis);

    builder.resolver(move |args| {
        let value = value.clone();
        let fail = fail.clone();
        async move {
            if let Some(delay) = delay {
                trace!(?delay, "simulating latency");
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = fail {
                return Err(anyhow!("{message}"));
            }
            Ok(value.unwrap_or(args.deps))
        }
    })
}
