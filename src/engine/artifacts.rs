// src/engine/artifacts.rs

//! Artifact recorder.
//!
//! After a run settles, the root's dependency tree is walked once more and
//! every task leaf is replaced by the outcome it produced in that run. The
//! resulting snapshot is stored on the root, replacing any previous one. It
//! is purely observational and never feeds back into later runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Outcome, RunOutcomes};
use crate::task::{DepEntry, DepTree, Task};

/// Dependency tree shape with each task replaced by its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultTree {
    Leaf(Outcome),
    Branch(BTreeMap<String, ResultTree>),
}

impl ResultTree {
    pub fn as_outcome(&self) -> Option<&Outcome> {
        match self {
            ResultTree::Leaf(outcome) => Some(outcome),
            ResultTree::Branch(_) => None,
        }
    }

    /// Child of a branch by key.
    pub fn get(&self, key: &str) -> Option<&ResultTree> {
        match self {
            ResultTree::Leaf(_) => None,
            ResultTree::Branch(children) => children.get(key),
        }
    }
}

/// Outcomes of the root's dependencies from its most recent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSnapshot {
    pub completed_at: DateTime<Utc>,
    pub results: BTreeMap<String, ResultTree>,
}

impl ArtifactSnapshot {
    pub fn get(&self, key: &str) -> Option<&ResultTree> {
        self.results.get(key)
    }

    /// Outcome recorded for the task declared at `path`, e.g.
    /// `["nested", "inner"]`.
    pub fn outcome_at(&self, path: &[&str]) -> Option<&Outcome> {
        let (first, rest) = path.split_first()?;
        let mut node = self.results.get(*first)?;
        for key in rest {
            node = node.get(key)?;
        }
        node.as_outcome()
    }
}

/// Mirror `tree` with each task replaced by its recorded outcome.
///
/// A task with no recorded outcome is left out of the result.
pub fn build_result_tree<C>(
    tree: &DepTree<C>,
    outcomes: &RunOutcomes,
) -> BTreeMap<String, ResultTree> {
    let mut results = BTreeMap::new();
    for (key, entry) in tree.iter() {
        match entry {
            DepEntry::Task(task) => match outcomes.get(&task.id()) {
                Some(outcome) => {
                    results.insert(key.clone(), ResultTree::Leaf(outcome.clone()));
                }
                None => {
                    warn!(task = %task.label(), key = %key, "no outcome recorded; leaving out of artifacts");
                }
            },
            DepEntry::Tree(nested) => {
                results.insert(
                    key.clone(),
                    ResultTree::Branch(build_result_tree(nested, outcomes)),
                );
            }
        }
    }
    results
}

/// Build the snapshot for a finished run rooted at `root`.
pub fn record_artifacts<C>(root: &Task<C>, outcomes: &RunOutcomes) -> Arc<ArtifactSnapshot> {
    let snapshot = ArtifactSnapshot {
        completed_at: Utc::now(),
        results: build_result_tree(root.dependencies(), outcomes),
    };
    debug!(
        task = %root.label(),
        entries = snapshot.results.len(),
        "recorded artifacts"
    );
    Arc::new(snapshot)
}
