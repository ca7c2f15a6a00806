// src/engine/scheduler.rs

//! Pluggable scheduling strategy and the per-task execution step shared by
//! every strategy.
//!
//! [`Task::run`](crate::task::Task::run) talks to a [`Scheduler`] instead of
//! a concrete strategy, so tests can swap in their own implementation while
//! production code picks [`ConcurrentScheduler`](super::ConcurrentScheduler)
//! or [`SequentialScheduler`](super::SequentialScheduler) from the root's
//! execution mode.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;

use futures::FutureExt;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{Outcome, RunOutcomes};
use crate::dag::ExecutionPlan;
use crate::errors::UNKNOWN_ERROR;
use crate::task::{DepEntry, DepTree, ResolverArgs, Task};

/// Trait abstracting how a levelled closure is executed.
pub trait Scheduler<C>: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Execute every task of `plan` and return the outcome of each.
    ///
    /// Implementations must not start a task's resolver before all of its
    /// direct dependencies have settled, and must record exactly one outcome
    /// per executed task.
    fn execute<'a>(
        &'a self,
        plan: &'a ExecutionPlan<C>,
        input: Value,
        run_id: u64,
    ) -> Pin<Box<dyn Future<Output = RunOutcomes> + Send + 'a>>;
}

/// Build the `deps` value handed to a resolver: same shape as `tree`, each
/// task replaced by its recorded value. Failed or missing dependencies
/// become `null`.
pub(crate) fn load_dep_values<C>(tree: &DepTree<C>, outcomes: &RunOutcomes) -> Value {
    let mut object = Map::new();
    for (key, entry) in tree.iter() {
        let value = match entry {
            DepEntry::Task(dep) => outcomes
                .get(&dep.id())
                .and_then(Outcome::value)
                .cloned()
                .unwrap_or(Value::Null),
            DepEntry::Tree(nested) => load_dep_values(nested, outcomes),
        };
        object.insert(key.clone(), value);
    }
    Value::Object(object)
}

/// Run one task's resolver to completion and turn the result into an
/// [`Outcome`]. Errors and panics both become failed outcomes.
pub(crate) async fn execute_task<C: Send + 'static>(
    task: &Task<C>,
    input: Value,
    deps: Value,
    run_id: u64,
) -> Outcome {
    debug!(task = %task.label(), run_id, "invoking resolver");

    let started = panic::catch_unwind(AssertUnwindSafe(|| {
        let args = ResolverArgs {
            ctx: task.provide_context(),
            input,
            deps,
        };
        (*task.resolver())(args)
    }));

    let result = match started {
        Ok(pending) => AssertUnwindSafe(pending).catch_unwind().await,
        Err(payload) => Err(payload),
    };

    let outcome = match result {
        Ok(Ok(value)) => Outcome::succeeded(value),
        Ok(Err(err)) => Outcome::failed(failure_message(&err)),
        Err(payload) => Outcome::failed(panic_message(payload.as_ref())),
    };

    match &outcome {
        Outcome::Succeeded { .. } => debug!(task = %task.label(), run_id, "task succeeded"),
        Outcome::Failed { error } => warn!(
            task = %task.label(),
            run_id,
            error = %error,
            "task failed; dependents will receive null"
        ),
    }

    outcome
}

fn failure_message(err: &anyhow::Error) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("task panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("task panicked: {s}")
    } else {
        "task panicked".to_string()
    }
}
