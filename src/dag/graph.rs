// src/dag/graph.rs

use std::collections::{HashMap, HashSet, VecDeque};

use crate::task::{DepEntry, DepTree, Task, TaskId};

/// Distinct tasks reachable at any depth of a dependency tree, in first
/// discovery order (key order, depth first). Deduplication is by id.
pub fn flatten<C>(tree: &DepTree<C>) -> Vec<Task<C>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    flatten_into(tree, &mut seen, &mut out);
    out
}

fn flatten_into<C>(tree: &DepTree<C>, seen: &mut HashSet<TaskId>, out: &mut Vec<Task<C>>) {
    for (_key, entry) in tree.iter() {
        match entry {
            DepEntry::Task(task) => {
                if seen.insert(task.id()) {
                    out.push(task.clone());
                }
            }
            DepEntry::Tree(nested) => flatten_into(nested, seen, out),
        }
    }
}

struct GraphNode<C> {
    task: Task<C>,
    /// Direct dependencies: tasks that must settle before this one runs.
    deps: Vec<TaskId>,
}

/// Arena holding the execution closure of one root task.
///
/// Tasks are stored once per id and edges are id references, so shared
/// sub-dependencies appear exactly once no matter how many paths reach them.
pub struct TaskGraph<C> {
    root: TaskId,
    nodes: HashMap<TaskId, GraphNode<C>>,
    /// Ids in discovery order; the root is always last.
    order: Vec<TaskId>,
}

impl<C> TaskGraph<C> {
    /// Collect every task transitively reachable from `root`'s dependency
    /// tree, plus the root itself.
    ///
    /// Repeatedly flattens the trees of newly discovered tasks until no new
    /// task shows up.
    pub fn from_root(root: &Task<C>) -> Self {
        let mut nodes: HashMap<TaskId, GraphNode<C>> = HashMap::new();
        let mut order: Vec<TaskId> = Vec::new();
        let mut queue: VecDeque<Task<C>> = flatten(root.dependencies()).into();

        while let Some(task) = queue.pop_front() {
            let id = task.id();
            if nodes.contains_key(&id) || id == root.id() {
                continue;
            }

            let direct = flatten(task.dependencies());
            let deps = direct.iter().map(Task::id).collect();
            queue.extend(
                direct
                    .into_iter()
                    .filter(|dep| !nodes.contains_key(&dep.id())),
            );

            nodes.insert(id, GraphNode { task, deps });
            order.push(id);
        }

        nodes.insert(
            root.id(),
            GraphNode {
                task: root.clone(),
                deps: flatten(root.dependencies()).iter().map(Task::id).collect(),
            },
        );
        order.push(root.id());

        Self {
            root: root.id(),
            nodes,
            order,
        }
    }

    pub fn root(&self) -> TaskId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task<C>> {
        self.nodes.get(&id).map(|n| &n.task)
    }

    /// Ids in discovery order (root last).
    pub fn discovery_order(&self) -> &[TaskId] {
        &self.order
    }

    /// Immediate dependencies of a task, deduplicated.
    pub fn dependencies_of(&self, id: TaskId) -> &[TaskId] {
        self.nodes
            .get(&id)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// `(task, direct deps)` pairs in discovery order, as consumed by
    /// [`assign_levels`](super::levels::assign_levels).
    pub fn edges(&self) -> impl Iterator<Item = (TaskId, &[TaskId])> {
        self.order.iter().map(|id| (*id, self.dependencies_of(*id)))
    }
}
