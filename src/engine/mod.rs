// src/engine/mod.rs

//! Execution engine.
//!
//! This module ties together:
//! - per-task [`Outcome`]s and the per-run outcome map
//! - the [`Scheduler`] seam and its two strategies:
//!   - [`ConcurrentScheduler`]: each task waits only for its direct
//!     dependencies to settle
//!   - [`SequentialScheduler`]: one task at a time, by ascending level
//! - the artifact recorder in [`artifacts`]
//!
//! Failures are local: a failed task records a failed outcome and its
//! dependents receive `null` for it instead of failing themselves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::task::TaskId;

pub mod artifacts;
pub mod concurrent;
pub mod scheduler;
pub mod sequential;

pub use artifacts::{ArtifactSnapshot, ResultTree};
pub use concurrent::ConcurrentScheduler;
pub use scheduler::Scheduler;
pub use sequential::SequentialScheduler;

/// Result of one task's single execution attempt in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded { value: Value },
    Failed { error: String },
}

impl Outcome {
    pub fn succeeded(value: Value) -> Self {
        Outcome::Succeeded { value }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Outcome::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Succeeded { value } => Some(value),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Succeeded { .. } => None,
            Outcome::Failed { error } => Some(error),
        }
    }
}

/// Outcomes of one run keyed by task. Exclusive to that run.
pub type RunOutcomes = HashMap<TaskId, Outcome>;

static RUN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Monotonically increasing run identifier, used to correlate log lines.
pub(crate) fn next_run_id() -> u64 {
    RUN_COUNTER.fetch_add(1, Ordering::Relaxed)
}
