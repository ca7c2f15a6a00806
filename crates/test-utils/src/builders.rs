#![allow(dead_code)]

use std::collections::BTreeMap;

use serde_json::Value;
use taskgraph::config::{ConfigSection, DepSpec, PipelineFile, RawPipelineFile, TaskConfig};
use taskgraph::types::ExecutionMode;

/// Builder for `PipelineFile` to simplify test setup.
pub struct PipelineFileBuilder {
    raw: RawPipelineFile,
}

impl PipelineFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawPipelineFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.raw.task.insert(name.to_string(), task);
        self
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.raw.config.mode = mode;
        self
    }

    pub fn root(mut self, name: &str) -> Self {
        self.raw.config.root = Some(name.to_string());
        self
    }

    /// The unvalidated model, for tests that expect validation to fail.
    pub fn build_raw(self) -> RawPipelineFile {
        self.raw
    }

    pub fn build(self) -> PipelineFile {
        PipelineFile::try_from(self.raw).expect("Failed to build valid pipeline from builder")
    }
}

impl Default for PipelineFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    /// Declare `name` under `key`.
    pub fn dep(mut self, key: &str, name: &str) -> Self {
        self.task
            .deps
            .insert(key.to_string(), DepSpec::Task(name.to_string()));
        self
    }

    /// Declare a nested table of `(key, task name)` pairs under `key`.
    pub fn nested(mut self, key: &str, entries: &[(&str, &str)]) -> Self {
        let children = entries
            .iter()
            .map(|(k, name)| (k.to_string(), DepSpec::Task(name.to_string())))
            .collect();
        self.task.deps.insert(key.to_string(), DepSpec::Tree(children));
        self
    }

    pub fn value(mut self, value: Value) -> Self {
        self.task.value = Some(value);
        self
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.task.fail = Some(message.to_string());
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.task.delay_ms = Some(ms);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
