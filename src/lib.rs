// src/lib.rs

//! Dependency-graph execution engine.
//!
//! Declare tasks with [`TaskBuilder`], wire them together through nested
//! [`DepTree`]s and call [`Task::run`] on a root. The engine resolves the
//! closure of the root, assigns topological levels and executes it either
//! concurrently or sequentially, recording an [`ArtifactSnapshot`] of the
//! root's dependency outcomes after every run.
//!
//! The `taskgraph` binary runs pipelines described in TOML (see [`config`]).

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod task;
pub mod types;

use anyhow::{Context as _, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{PipelineFile, build_tasks, load_and_validate, resolve_root};

pub use crate::dag::ExecutionPlan;
pub use crate::engine::{ArtifactSnapshot, ConcurrentScheduler, Outcome, ResultTree, Scheduler, SequentialScheduler};
pub use crate::errors::{TaskGraphError, UNKNOWN_ERROR};
pub use crate::task::{DepEntry, DepTree, ResolverArgs, Task, TaskBuilder, TaskId};
pub use crate::types::ExecutionMode;

/// What `taskgraph` prints on stdout after a run.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub root: &'a str,
    pub mode: String,
    pub outcome: Outcome,
    pub artifacts: Option<&'a ArtifactSnapshot>,
}

/// High-level entry point used by `main.rs`.
///
/// - loads and validates the pipeline file
/// - applies CLI overrides (`--mode`, `--root`)
/// - builds the tasks and runs the root (or prints the plan on `--dry-run`)
///
/// A failing root is reported on stdout and then returned as an error.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone();
    let mut cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading pipeline from {}", config_path.display()))?;

    if let Some(mode) = args.mode {
        cfg.config.mode = mode;
    }

    let root_name = resolve_root(&cfg, args.root.as_deref())?;
    let tasks = build_tasks(&cfg)?;
    let root = tasks
        .get(&root_name)
        .ok_or_else(|| TaskGraphError::TaskNotFound(root_name.clone()))?;

    if args.dry_run {
        print_dry_run(&cfg, root)?;
        return Ok(());
    }

    let input = parse_input(args.input.as_deref())?;
    info!(root = %root_name, mode = %cfg.config.mode, "running pipeline");

    let result = root.run(input).await;
    let outcome = match &result {
        Ok(value) => Outcome::succeeded(value.clone()),
        Err(err) => Outcome::failed(err.to_string()),
    };

    let snapshot = root.get_artifacts();
    let report = RunReport {
        root: &root_name,
        mode: cfg.config.mode.to_string(),
        outcome,
        artifacts: snapshot.as_deref(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    result?;
    Ok(())
}

/// `--input` as JSON; absent input is `null`.
fn parse_input(raw: Option<&str>) -> Result<Value> {
    match raw {
        Some(text) => serde_json::from_str(text)
            .map_err(|err| TaskGraphError::InvalidInput(format!("--input is not valid JSON: {err}")).into()),
        None => Ok(Value::Null),
    }
}

/// Print the levelled plan of the root without executing anything.
fn print_dry_run(cfg: &PipelineFile, root: &Task) -> Result<()> {
    let plan = root.plan()?;

    println!("taskgraph dry-run");
    println!("  config.mode = {}", cfg.config.mode);
    println!("  root = {}", root.label());
    println!();

    println!("levels ({} tasks):", plan.len());
    for (level, ids) in plan.stages().iter().enumerate() {
        let names: Vec<String> = ids
            .iter()
            .filter_map(|id| plan.task(*id))
            .map(Task::label)
            .collect();
        println!("  {level}: {}", names.join(", "));
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_input_is_null() {
        assert_eq!(parse_input(None).unwrap(), Value::Null);
        assert_eq!(parse_input(Some(r#"{"a": 1}"#)).unwrap(), json!({ "a": 1 }));
    }

    #[test]
    fn malformed_input_is_rejected() {
        let err = parse_input(Some("{not json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TaskGraphError>(),
            Some(TaskGraphError::InvalidInput(_))
        ));
    }
}
