// src/engine/sequential.rs

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tracing::debug;

use super::scheduler::{execute_task, load_dep_values, Scheduler};
use super::RunOutcomes;
use crate::dag::ExecutionPlan;

/// Runs the closure one task at a time in ascending level order, ties in
/// discovery order. A task starts only after the previous one has settled,
/// even if the two are unrelated.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialScheduler;

impl<C: Send + 'static> Scheduler<C> for SequentialScheduler {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn execute<'a>(
        &'a self,
        plan: &'a ExecutionPlan<C>,
        input: Value,
        run_id: u64,
    ) -> Pin<Box<dyn Future<Output = RunOutcomes> + Send + 'a>> {
        Box::pin(async move {
            let mut outcomes = RunOutcomes::with_capacity(plan.len());

            for task in plan.tasks() {
                debug!(
                    task = %task.label(),
                    run_id,
                    level = plan.level_of(task.id()).unwrap_or(0),
                    "running task"
                );

                let deps = load_dep_values(task.dependencies(), &outcomes);
                let outcome = execute_task(task, input.clone(), deps, run_id).await;
                outcomes.insert(task.id(), outcome);
            }

            outcomes
        })
    }
}
