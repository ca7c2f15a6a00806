// src/task/deps.rs

//! Dependency trees: the nested naming structure a task declares over the
//! tasks it depends on.
//!
//! ```text
//! {
//!   first: <task A>,
//!   nested: { inner: { deepest: <task A> } },
//! }
//! ```
//!
//! The same task may appear under several keys; the engine treats every
//! occurrence as one logical task (same [`TaskId`](super::TaskId)).

use std::collections::BTreeMap;
use std::fmt;

use super::Task;

/// One entry of a [`DepTree`]: either a task or another nested tree.
pub enum DepEntry<C = ()> {
    Task(Task<C>),
    Tree(DepTree<C>),
}

impl<C> Clone for DepEntry<C> {
    fn clone(&self) -> Self {
        match self {
            DepEntry::Task(task) => DepEntry::Task(task.clone()),
            DepEntry::Tree(tree) => DepEntry::Tree(tree.clone()),
        }
    }
}

impl<C> fmt::Debug for DepEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepEntry::Task(task) => f.debug_tuple("Task").field(task).finish(),
            DepEntry::Tree(tree) => f.debug_tuple("Tree").field(tree).finish(),
        }
    }
}

impl<C> From<Task<C>> for DepEntry<C> {
    fn from(task: Task<C>) -> Self {
        DepEntry::Task(task)
    }
}

impl<C> From<&Task<C>> for DepEntry<C> {
    fn from(task: &Task<C>) -> Self {
        DepEntry::Task(task.clone())
    }
}

impl<C> From<DepTree<C>> for DepEntry<C> {
    fn from(tree: DepTree<C>) -> Self {
        DepEntry::Tree(tree)
    }
}

/// Mapping from string keys to tasks or nested trees.
///
/// Keys are unique per level. Iteration is in key order, which is also the
/// order in which the engine discovers tasks.
pub struct DepTree<C = ()> {
    entries: BTreeMap<String, DepEntry<C>>,
}

impl<C> DepTree<C> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, entry: impl Into<DepEntry<C>>) -> Self {
        self.insert(key, entry);
        self
    }

    /// Insert an entry, returning the entry previously stored under `key`.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        entry: impl Into<DepEntry<C>>,
    ) -> Option<DepEntry<C>> {
        self.entries.insert(key.into(), entry.into())
    }

    pub fn get(&self, key: &str) -> Option<&DepEntry<C>> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DepEntry<C>)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Default for DepTree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for DepTree<C> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<C> fmt::Debug for DepTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
