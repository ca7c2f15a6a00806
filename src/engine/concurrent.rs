// src/engine/concurrent.rs

//! Wait-graph scheduler.
//!
//! Every task in the plan gets its own spawned unit of work. A unit first
//! waits for the units of its direct dependencies to settle (success or
//! failure), then loads their values from the run's outcome map, runs the
//! resolver and records the result. Independent branches therefore proceed
//! in parallel and a chain of `n` tasks takes `n` steps no matter how wide
//! the rest of the closure is.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use super::scheduler::{execute_task, load_dep_values, Scheduler};
use super::RunOutcomes;
use crate::dag::ExecutionPlan;
use crate::task::TaskId;

type Unit = Shared<BoxFuture<'static, ()>>;

/// Runs each task as soon as its direct dependencies have settled.
///
/// Requires a Tokio runtime: units are started with `tokio::spawn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentScheduler;

impl<C: Send + 'static> Scheduler<C> for ConcurrentScheduler {
    fn name(&self) -> &'static str {
        "concurrent"
    }

    fn execute<'a>(
        &'a self,
        plan: &'a ExecutionPlan<C>,
        input: Value,
        run_id: u64,
    ) -> Pin<Box<dyn Future<Output = RunOutcomes> + Send + 'a>> {
        Box::pin(async move {
            let outcomes = Arc::new(Mutex::new(RunOutcomes::with_capacity(plan.len())));
            let mut units: HashMap<TaskId, Unit> = HashMap::with_capacity(plan.len());

            // Plan order is by level, so every dependency's unit exists by
            // the time its dependents are wired up.
            for &id in plan.order() {
                let Some(task) = plan.task(id) else {
                    warn!(task = %id, run_id, "task missing from plan; skipping");
                    continue;
                };

                let waits_on: Vec<Unit> = plan
                    .dependencies_of(id)
                    .iter()
                    .filter_map(|dep| units.get(dep).cloned())
                    .collect();

                let task = task.clone();
                let input = input.clone();
                let outcomes = Arc::clone(&outcomes);

                let handle = tokio::spawn(async move {
                    if !waits_on.is_empty() {
                        trace!(task = %task.label(), run_id, deps = waits_on.len(), "waiting on dependencies");
                        future::join_all(waits_on).await;
                    }

                    let deps = {
                        let recorded = outcomes.lock().await;
                        load_dep_values(task.dependencies(), &recorded)
                    };

                    let outcome = execute_task(&task, input, deps, run_id).await;
                    outcomes.lock().await.insert(task.id(), outcome);
                });

                let unit: Unit = async move {
                    if let Err(err) = handle.await {
                        warn!(task = %id, run_id, error = %err, "task unit aborted");
                    }
                }
                .boxed()
                .shared();

                units.insert(id, unit);
            }

            debug!(run_id, units = units.len(), "spawned task units; awaiting root");

            // Every unit in the closure is an ancestor of the root, so once the
            // root settles the whole closure has settled.
            if let Some(root) = units.remove(&plan.root()) {
                root.await;
            }

            std::mem::take(&mut *outcomes.lock().await)
        })
    }
}
