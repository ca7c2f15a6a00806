// src/task/builder.rs

//! Fluent builder for tasks.
//!
//! A builder is a reusable template: every finishing call (`resolver`,
//! `resolver_sync`, `plugin`) mints a brand new [`Task`] with its own id, so
//! one builder can stamp out many independent tasks.
//!
//! ```ignore
//! let builder = TaskBuilder::new();
//! let fetch = builder.resolver(|_| async { Ok(json!({ "n": 1 })) });
//! let double = builder
//!     .depend(DepTree::new().with("fetch", &fetch))
//!     .resolver_sync(|args| {
//!         let n: i64 = args.dep_at::<i64>(&["fetch", "n"])?;
//!         Ok(json!({ "n": n * 2 }))
//!     });
//! ```

use std::future::Future;
use std::sync::{Arc, RwLock};

use anyhow::Context as _;
use futures::FutureExt;
use futures::future;
use serde::Serialize;
use serde_json::Value;

use super::{ContextFn, DepTree, InputValidator, ResolverArgs, ResolverFn, Task, TaskDef, TaskId};
use crate::types::ExecutionMode;

pub(crate) fn to_json<V: Serialize>(value: V) -> anyhow::Result<Value> {
    serde_json::to_value(value).context("serializing task output")
}

pub struct TaskBuilder<C = ()> {
    name: Option<String>,
    context: ContextFn<C>,
    validator: Option<InputValidator>,
    deps: DepTree<C>,
    mode: ExecutionMode,
}

impl<C> Clone for TaskBuilder<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            context: Arc::clone(&self.context),
            validator: self.validator.clone(),
            deps: self.deps.clone(),
            mode: self.mode,
        }
    }
}

impl TaskBuilder<()> {
    /// Builder whose tasks receive `()` as context.
    pub fn new() -> Self {
        Self::with_context(|| ())
    }
}

impl Default for TaskBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send + 'static> TaskBuilder<C> {
    /// Builder whose tasks call `provider` once per task per run to obtain
    /// their context value.
    pub fn with_context<F>(provider: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            name: None,
            context: Arc::new(provider),
            validator: None,
            deps: DepTree::new(),
            mode: ExecutionMode::default(),
        }
    }

    pub fn name(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.name = Some(name.into());
        next
    }

    /// Attach an input validator. It sees the raw input of runs rooted at
    /// the finished task and may transform it; an error aborts the run
    /// before anything executes.
    pub fn input<F>(&self, validator: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let mut next = self.clone();
        next.validator = Some(Arc::new(validator));
        next
    }

    /// Replace the dependency tree.
    pub fn depend(&self, deps: DepTree<C>) -> Self {
        let mut next = self.clone();
        next.deps = deps;
        next
    }

    pub fn mode(&self, mode: ExecutionMode) -> Self {
        let mut next = self.clone();
        next.mode = mode;
        next
    }

    pub fn sequential(&self) -> Self {
        self.mode(ExecutionMode::Sequential)
    }

    /// Finish with an asynchronous resolver.
    pub fn resolver<F, Fut, V>(&self, resolve: F) -> Task<C>
    where
        F: Fn(ResolverArgs<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
        V: Serialize,
    {
        let resolver: ResolverFn<C> = Arc::new(move |args| {
            let pending = resolve(args);
            async move { to_json(pending.await?) }.boxed()
        });
        self.finish(resolver)
    }

    /// Finish with a synchronous resolver.
    pub fn resolver_sync<F, V>(&self, resolve: F) -> Task<C>
    where
        F: Fn(ResolverArgs<C>) -> anyhow::Result<V> + Send + Sync + 'static,
        V: Serialize,
    {
        let resolver: ResolverFn<C> = Arc::new(move |args| {
            let output = resolve(args).and_then(to_json);
            future::ready(output).boxed()
        });
        self.finish(resolver)
    }

    /// Finish by adapting an external processing step: `feed_input` extracts
    /// the plugin's input from the resolver arguments, then `plugin`
    /// transforms it. The two always run in that order.
    pub fn plugin<FI, FIFut, P, PF, PFut, V>(&self, feed_input: FI, plugin: PF) -> Task<C>
    where
        FI: Fn(ResolverArgs<C>) -> FIFut + Send + Sync + 'static,
        FIFut: Future<Output = anyhow::Result<P>> + Send + 'static,
        P: Send + 'static,
        PF: Fn(P) -> PFut + Send + Sync + 'static,
        PFut: Future<Output = anyhow::Result<V>> + Send + 'static,
        V: Serialize,
    {
        let plugin = Arc::new(plugin);
        let resolver: ResolverFn<C> = Arc::new(move |args| {
            let extracted = feed_input(args);
            let plugin = Arc::clone(&plugin);
            async move {
                let plugin_input = extracted.await?;
                to_json((*plugin)(plugin_input).await?)
            }
            .boxed()
        });
        self.finish(resolver)
    }

    fn finish(&self, resolver: ResolverFn<C>) -> Task<C> {
        Task::from_def(TaskDef {
            id: TaskId::next(),
            name: self.name.clone(),
            deps: self.deps.clone(),
            resolver,
            context: Arc::clone(&self.context),
            validator: self.validator.clone(),
            mode: self.mode,
            artifacts: RwLock::new(None),
        })
    }
}
