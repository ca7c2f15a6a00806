// tests/task_api.rs

mod common;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use serde_json::{Value, json};
use taskgraph::engine::RunOutcomes;
use taskgraph::{
    DepTree, ExecutionPlan, Outcome, Scheduler, SequentialScheduler, TaskBuilder, TaskGraphError,
};

#[tokio::test]
async fn then_feeds_the_original_output_into_the_next_step() -> TestResult {
    init_tracing();

    let builder = TaskBuilder::new();
    let base = builder.resolver_sync(|_| Ok(json!({ "n": 4 })));
    let task = builder
        .name("double")
        .depend(DepTree::new().with("base", &base))
        .resolver_sync(|args| Ok(args.dep_at::<i64>(&["base", "n"])? * 2));

    let derived = task.then(|out: Value| async move {
        let n = out.as_i64().unwrap_or_default();
        Ok::<_, anyhow::Error>(json!({ "n": n + 1 }))
    });

    assert_ne!(derived.id(), task.id());
    assert_eq!(derived.name(), Some("double.then"));
    assert_eq!(derived.dependencies().len(), 1);

    assert_eq!(with_timeout(derived.run(Value::Null)).await?, json!({ "n": 9 }));
    assert_eq!(with_timeout(task.run(Value::Null)).await?, json!(8));

    Ok(())
}

#[tokio::test]
async fn then_propagates_upstream_failure() {
    init_tracing();

    let task = TaskBuilder::new()
        .resolver_sync(|_| -> anyhow::Result<Value> { Err(anyhow::anyhow!("upstream")) });
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let derived = task.then(move |v: Value| {
        seen.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, anyhow::Error>(v) }
    });

    let err = with_timeout(derived.run(Value::Null)).await.unwrap_err();
    assert_eq!(err.to_string(), "upstream");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn run_as_decodes_the_root_value() -> TestResult {
    init_tracing();

    #[derive(Debug, Deserialize, PartialEq)]
    struct Report {
        total: i64,
        label: String,
    }

    let task = TaskBuilder::new().resolver_sync(|_| Ok(json!({ "total": 3, "label": "x" })));
    let report: Report = with_timeout(task.run_as(Value::Null)).await?;
    assert_eq!(
        report,
        Report {
            total: 3,
            label: "x".into()
        }
    );

    Ok(())
}

#[tokio::test]
async fn rejected_input_fails_before_anything_runs() {
    init_tracing();

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let task = TaskBuilder::new()
        .input(|input: Value| {
            if input.get("id").is_some() {
                Ok(input)
            } else {
                anyhow::bail!("missing field `id`")
            }
        })
        .resolver_sync(move |args| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(args.input)
        });

    let err = with_timeout(task.run(json!({}))).await.unwrap_err();
    match err {
        TaskGraphError::InvalidInput(msg) => assert!(msg.contains("missing field `id`")),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(task.get_artifacts().is_none());

    let value = with_timeout(task.run(json!({ "id": 1 }))).await.unwrap();
    assert_eq!(value, json!({ "id": 1 }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn validator_may_rewrite_the_input() -> TestResult {
    init_tracing();

    let builder = TaskBuilder::new();
    let leaf = builder.resolver_sync(|args| Ok(args.input["limit"].clone()));
    let root = builder
        .input(|mut input: Value| {
            if input.get("limit").is_none() {
                input["limit"] = json!(10);
            }
            Ok(input)
        })
        .depend(DepTree::new().with("leaf", &leaf))
        .resolver_sync(|args| Ok(args.deps["leaf"].clone()));

    assert_eq!(with_timeout(root.run(json!({}))).await?, json!(10));

    Ok(())
}

#[tokio::test]
async fn artifacts_are_replaced_on_every_run() -> TestResult {
    init_tracing();

    let counter = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&counter);
    let builder = TaskBuilder::new();
    let ticking = builder.resolver_sync(move |_| Ok(seen.fetch_add(1, Ordering::SeqCst)));
    let root = builder
        .depend(DepTree::new().with("tick", &ticking))
        .resolver_sync(|_| Ok("done"));

    assert!(root.get_artifacts().is_none());

    with_timeout(root.run(Value::Null)).await?;
    let first = root.get_artifacts().unwrap();
    assert_eq!(first.outcome_at(&["tick"]), Some(&Outcome::succeeded(json!(0))));

    with_timeout(root.run(Value::Null)).await?;
    let second = root.get_artifacts().unwrap();
    assert_eq!(second.outcome_at(&["tick"]), Some(&Outcome::succeeded(json!(1))));
    assert!(second.completed_at >= first.completed_at);

    // The earlier snapshot is untouched; the task only points at the newer one.
    assert_eq!(first.outcome_at(&["tick"]), Some(&Outcome::succeeded(json!(0))));
    // Dependencies never get snapshots of their own from someone else's run.
    assert!(ticking.get_artifacts().is_none());

    Ok(())
}

#[tokio::test]
async fn snapshot_serializes_with_timestamp_and_results() -> TestResult {
    init_tracing();

    let builder = TaskBuilder::new();
    let a = builder.resolver_sync(|_| Ok(1));
    let root = builder
        .depend(DepTree::new().with("group", DepTree::new().with("a", &a)))
        .resolver_sync(|_| Ok(2));

    with_timeout(root.run(Value::Null)).await?;
    let snapshot = serde_json::to_value(&*root.get_artifacts().unwrap())?;

    assert!(snapshot["completed_at"].is_string());
    assert_eq!(
        snapshot["results"],
        json!({ "group": { "a": { "outcome": "succeeded", "value": 1 } } })
    );

    Ok(())
}

/// Scheduler that delegates to the sequential one and counts invocations.
struct CountingScheduler {
    inner: SequentialScheduler,
    runs: AtomicUsize,
}

impl Scheduler<()> for CountingScheduler {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn execute<'a>(
        &'a self,
        plan: &'a ExecutionPlan<()>,
        input: Value,
        run_id: u64,
    ) -> Pin<Box<dyn Future<Output = RunOutcomes> + Send + 'a>> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(plan, input, run_id)
    }
}

#[tokio::test]
async fn run_with_uses_the_given_scheduler() -> TestResult {
    init_tracing();

    let scheduler = CountingScheduler {
        inner: SequentialScheduler,
        runs: AtomicUsize::new(0),
    };

    let builder = TaskBuilder::new();
    let a = builder.resolver_sync(|_| Ok(2));
    let root = builder
        .depend(DepTree::new().with("a", &a))
        .resolver_sync(|args| Ok(args.dep::<i64>("a")? * 21));

    assert_eq!(with_timeout(root.run_with(&scheduler, Value::Null)).await?, json!(42));
    assert_eq!(scheduler.runs.load(Ordering::SeqCst), 1);

    Ok(())
}

#[test]
fn plan_levels_without_running() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let builder = TaskBuilder::new();
    let a = builder.resolver_sync(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    });
    let b = builder
        .depend(DepTree::new().with("a", &a))
        .resolver_sync(|_| Ok(2));

    let plan = b.plan().unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.root(), b.id());
    assert_eq!(plan.level_of(a.id()), Some(0));
    assert_eq!(plan.level_of(b.id()), Some(1));
    assert_eq!(plan.order(), &[a.id(), b.id()]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
