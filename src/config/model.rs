// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::types::ExecutionMode;

/// Pipeline file exactly as read from TOML, before validation.
///
/// ```toml
/// [config]
/// mode = "concurrent"
/// root = "report"
///
/// [task.fetch]
/// value = { string = "string", number = 1 }
/// delay_ms = 100
///
/// [task.report]
/// deps = { first = "fetch", nested = { inner = "fetch" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPipelineFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated pipeline file. Only obtainable through
/// `PipelineFile::try_from(raw)`, which rejects unknown references and
/// cycles.
#[derive(Debug, Clone)]
pub struct PipelineFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
}

impl PipelineFile {
    pub(crate) fn new_unchecked(config: ConfigSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { config, task }
    }

    /// Names of tasks no other task depends on.
    pub fn sinks(&self) -> Vec<&str> {
        self.task
            .keys()
            .filter(|name| {
                !self
                    .task
                    .values()
                    .any(|t| t.dependency_names().contains(&name.as_str()))
            })
            .map(String::as_str)
            .collect()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Scheduling strategy for runs started from this file.
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Task to run when the CLI is not given `--root`.
    #[serde(default)]
    pub root: Option<String>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Dependency tree: keys map to a task name or a nested table.
    #[serde(default)]
    pub deps: BTreeMap<String, DepSpec>,

    /// Constant the task resolves to.
    #[serde(default)]
    pub value: Option<Value>,

    /// If set, the task fails with this message.
    #[serde(default)]
    pub fail: Option<String>,

    /// Simulated latency before the task settles.
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

impl TaskConfig {
    /// Every task name referenced anywhere in `deps`, deduplicated, in key
    /// order.
    pub fn dependency_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for spec in self.deps.values() {
            spec.collect_names(&mut names);
        }
        names
    }
}

/// One entry of a configured dependency tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DepSpec {
    Task(String),
    Tree(BTreeMap<String, DepSpec>),
}

impl DepSpec {
    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            DepSpec::Task(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            DepSpec::Tree(children) => {
                for child in children.values() {
                    child.collect_names(out);
                }
            }
        }
    }
}
