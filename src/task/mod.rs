// src/task/mod.rs

//! Task handles.
//!
//! A [`Task`] is a cheap, clonable handle to an immutable task definition:
//! a unique [`TaskId`], a [`DepTree`] over other tasks, a resolver and a
//! context provider. The only mutable state on a task is the artifact slot
//! written at the end of every run in which the task is the root.
//!
//! - [`deps`] holds the dependency tree data model.
//! - [`builder`] provides the fluent [`TaskBuilder`] used to declare tasks.

pub mod builder;
pub mod deps;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{anyhow, bail, Context as _};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::dag::ExecutionPlan;
use crate::engine::artifacts::{ArtifactSnapshot, record_artifacts};
use crate::engine::{ConcurrentScheduler, Outcome, Scheduler, SequentialScheduler, next_run_id};
use crate::errors::{Result, TaskGraphError};
use crate::types::ExecutionMode;

pub use builder::TaskBuilder;
pub use deps::{DepEntry, DepTree};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique task identifier.
///
/// Every finished builder call and every derived task mints a fresh id from
/// one monotonically increasing counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything a resolver receives for one execution.
///
/// `deps` mirrors the shape of the task's [`DepTree`]; a dependency that
/// failed in this run shows up as `null`.
pub struct ResolverArgs<C = ()> {
    pub ctx: C,
    pub input: Value,
    pub deps: Value,
}

impl<C> ResolverArgs<C> {
    /// Decode the dependency declared under a top-level `key`.
    pub fn dep<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<T> {
        self.dep_at(&[key])
    }

    /// Decode the dependency declared at a nested `path` of keys.
    ///
    /// Walking through a `null` (a dependency that failed in this run) is
    /// reported as such rather than as an undeclared key.
    pub fn dep_at<T: DeserializeOwned>(&self, path: &[&str]) -> anyhow::Result<T> {
        let mut current = &self.deps;
        for (depth, key) in path.iter().enumerate() {
            if current.is_null() && depth > 0 {
                bail!(
                    "dependency '{}' produced no value (failed?)",
                    path[..depth].join(".")
                );
            }
            current = current
                .get(key)
                .ok_or_else(|| anyhow!("no dependency declared at '{}'", path.join(".")))?;
        }

        serde_json::from_value(current.clone())
            .with_context(|| format!("decoding dependency '{}'", path.join(".")))
    }

    pub fn input_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        serde_json::from_value(self.input.clone()).context("decoding run input")
    }
}

pub(crate) type ResolverFn<C> =
    Arc<dyn Fn(ResolverArgs<C>) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;
pub(crate) type ContextFn<C> = Arc<dyn Fn() -> C + Send + Sync>;
pub(crate) type InputValidator = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

pub(crate) struct TaskDef<C> {
    pub(crate) id: TaskId,
    pub(crate) name: Option<String>,
    pub(crate) deps: DepTree<C>,
    pub(crate) resolver: ResolverFn<C>,
    pub(crate) context: ContextFn<C>,
    pub(crate) validator: Option<InputValidator>,
    pub(crate) mode: ExecutionMode,
    pub(crate) artifacts: RwLock<Option<Arc<ArtifactSnapshot>>>,
}

/// Handle to a declared task. Cloning shares the same identity.
pub struct Task<C = ()> {
    def: Arc<TaskDef<C>>,
}

impl<C> Clone for Task<C> {
    fn clone(&self) -> Self {
        Self {
            def: Arc::clone(&self.def),
        }
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.def.id)
            .field("name", &self.def.name)
            .field("mode", &self.def.mode)
            .finish_non_exhaustive()
    }
}

impl<C> Task<C> {
    pub(crate) fn from_def(def: TaskDef<C>) -> Self {
        Self { def: Arc::new(def) }
    }

    pub fn id(&self) -> TaskId {
        self.def.id
    }

    pub fn name(&self) -> Option<&str> {
        self.def.name.as_deref()
    }

    /// Name if one was given, otherwise the id. Used in logs.
    pub fn label(&self) -> String {
        match &self.def.name {
            Some(name) => name.clone(),
            None => format!("task{}", self.def.id),
        }
    }

    pub fn dependencies(&self) -> &DepTree<C> {
        &self.def.deps
    }

    /// Scheduling strategy `run` uses when this task is the root.
    pub fn mode(&self) -> ExecutionMode {
        self.def.mode
    }

    /// Snapshot recorded by the most recent run rooted at this task, if any.
    pub fn get_artifacts(&self) -> Option<Arc<ArtifactSnapshot>> {
        self.def
            .artifacts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_artifacts(&self, snapshot: Arc<ArtifactSnapshot>) {
        *self
            .def
            .artifacts
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    pub(crate) fn resolver(&self) -> &ResolverFn<C> {
        &self.def.resolver
    }

    pub(crate) fn provide_context(&self) -> C {
        (*self.def.context)()
    }

    fn validate_input(&self, input: Value) -> Result<Value> {
        match &self.def.validator {
            Some(validator) => (*validator)(input)
                .map_err(|err| TaskGraphError::InvalidInput(format!("{err:#}"))),
            None => Ok(input),
        }
    }
}

impl<C: Send + 'static> Task<C> {
    /// Resolve the closure of this task and assign topological levels
    /// without executing anything.
    pub fn plan(&self) -> Result<ExecutionPlan<C>> {
        ExecutionPlan::build(self)
    }

    /// Execute the closure rooted at this task with the scheduler selected
    /// by [`Task::mode`].
    ///
    /// Must be called from within a Tokio runtime. Resolves with the root's
    /// value; a failing root yields [`TaskGraphError::TaskFailed`] carrying
    /// the root's failure message. Failures of other tasks never fail the
    /// run on their own.
    pub async fn run(&self, input: Value) -> Result<Value> {
        match self.mode() {
            ExecutionMode::Concurrent => self.run_with(&ConcurrentScheduler, input).await,
            ExecutionMode::Sequential => self.run_with(&SequentialScheduler, input).await,
        }
    }

    /// Like [`Task::run`], decoding the root's value into `T`.
    pub async fn run_as<T: DeserializeOwned>(&self, input: Value) -> Result<T> {
        let value = self.run(input).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Execute the closure rooted at this task with an explicit scheduler.
    pub async fn run_with<S>(&self, scheduler: &S, input: Value) -> Result<Value>
    where
        S: Scheduler<C> + ?Sized,
    {
        let run_id = next_run_id();
        let input = self.validate_input(input)?;
        let plan = self.plan()?;

        info!(
            task = %self.label(),
            run_id,
            tasks = plan.len(),
            levels = plan.max_level() + 1,
            scheduler = scheduler.name(),
            "starting run"
        );

        let mut outcomes = scheduler.execute(&plan, input, run_id).await;
        let snapshot = record_artifacts(self, &outcomes);
        self.set_artifacts(snapshot);

        match outcomes.remove(&self.id()) {
            Some(Outcome::Succeeded { value }) => {
                info!(task = %self.label(), run_id, "run finished successfully");
                Ok(value)
            }
            Some(Outcome::Failed { error }) => {
                warn!(task = %self.label(), run_id, error = %error, "run failed at root");
                Err(TaskGraphError::TaskFailed(error))
            }
            None => Err(TaskGraphError::Other(anyhow!(
                "root task {} produced no outcome in run {run_id}",
                self.label()
            ))),
        }
    }

    /// Derive a new task with the same dependencies whose resolver runs this
    /// task's resolver and feeds its output into `step`.
    ///
    /// The derived task gets a fresh id; the original task is untouched.
    pub fn then<F, Fut, V>(&self, step: F) -> Task<C>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
        V: Serialize,
    {
        let upstream = Arc::clone(&self.def.resolver);
        let step = Arc::new(step);

        let resolver: ResolverFn<C> = Arc::new(move |args| {
            let first = (*upstream)(args);
            let step = Arc::clone(&step);
            async move {
                let output = first.await?;
                builder::to_json((*step)(output).await?)
            }
            .boxed()
        });

        Task::from_def(TaskDef {
            id: TaskId::next(),
            name: self.def.name.as_ref().map(|name| format!("{name}.then")),
            deps: self.def.deps.clone(),
            resolver,
            context: Arc::clone(&self.def.context),
            validator: self.def.validator.clone(),
            mode: self.def.mode,
            artifacts: RwLock::new(None),
        })
    }
}
