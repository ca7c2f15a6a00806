// src/dag/plan.rs

use std::collections::HashMap;

use tracing::debug;

use crate::dag::graph::TaskGraph;
use crate::dag::levels::assign_levels;
use crate::errors::Result;
use crate::task::{Task, TaskId};

/// A levelled execution closure, ready to hand to a scheduler.
///
/// Built fresh for every run; it owns no outcomes and never executes
/// anything itself.
pub struct ExecutionPlan<C> {
    graph: TaskGraph<C>,
    levels: HashMap<TaskId, usize>,
    /// Discovery order stably sorted by level.
    order: Vec<TaskId>,
}

impl<C> ExecutionPlan<C> {
    /// Build the closure of `root` and level it.
    ///
    /// Fails with `DagCycle` if the closure cannot be levelled.
    pub fn build(root: &Task<C>) -> Result<Self> {
        let graph = TaskGraph::from_root(root);
        let levels = assign_levels(graph.edges())?;

        let mut order = graph.discovery_order().to_vec();
        order.sort_by_key(|id| levels.get(id).copied().unwrap_or(0));

        debug!(
            root = %root.label(),
            tasks = graph.len(),
            max_level = levels.values().copied().max().unwrap_or(0),
            "built execution plan"
        );

        Ok(Self {
            graph,
            levels,
            order,
        })
    }

    pub fn root(&self) -> TaskId {
        self.graph.root()
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn level_of(&self, id: TaskId) -> Option<usize> {
        self.levels.get(&id).copied()
    }

    pub fn max_level(&self) -> usize {
        self.levels.values().copied().max().unwrap_or(0)
    }

    /// Execution order: ascending level, ties in discovery order.
    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    /// Tasks in execution order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task<C>> {
        self.order.iter().filter_map(|id| self.graph.task(*id))
    }

    pub fn task(&self, id: TaskId) -> Option<&Task<C>> {
        self.graph.task(id)
    }

    pub fn dependencies_of(&self, id: TaskId) -> &[TaskId] {
        self.graph.dependencies_of(id)
    }

    /// Task ids grouped by level, index = level.
    pub fn stages(&self) -> Vec<Vec<TaskId>> {
        let mut stages: Vec<Vec<TaskId>> = vec![Vec::new(); self.max_level() + 1];
        for id in self.order.iter() {
            if let Some(level) = self.level_of(*id) {
                stages[level].push(*id);
            }
        }
        stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{DepTree, TaskBuilder};

    #[test]
    fn root_sits_at_the_closure_maximum_level() {
        let builder = TaskBuilder::new();
        let a = builder.resolver_sync(|_| Ok(1));
        let b = builder
            .depend(DepTree::new().with("a", &a))
            .resolver_sync(|_| Ok(2));
        let side = builder.resolver_sync(|_| Ok(3));
        let root = builder
            .depend(DepTree::new().with("b", &b).with("side", &side))
            .resolver_sync(|_| Ok(4));

        let plan = ExecutionPlan::build(&root).unwrap();

        assert_eq!(plan.len(), 4);
        assert_eq!(plan.level_of(a.id()), Some(0));
        assert_eq!(plan.level_of(side.id()), Some(0));
        assert_eq!(plan.level_of(b.id()), Some(1));
        assert_eq!(plan.level_of(root.id()), Some(2));
        assert_eq!(plan.max_level(), 2);
        assert_eq!(plan.order().last(), Some(&root.id()));
    }

    #[test]
    fn order_is_non_decreasing_in_level() {
        let builder = TaskBuilder::new();
        let a = builder.resolver_sync(|_| Ok(1));
        let b = builder
            .depend(DepTree::new().with("a", &a))
            .resolver_sync(|_| Ok(2));
        let c = builder
            .depend(DepTree::new().with("a", &a).with("b", &b))
            .resolver_sync(|_| Ok(3));
        let d = builder
            .depend(DepTree::new().with("c", &c).with("a", &a))
            .resolver_sync(|_| Ok(4));

        let plan = ExecutionPlan::build(&d).unwrap();
        let levels: Vec<usize> = plan
            .order()
            .iter()
            .map(|id| plan.level_of(*id).unwrap())
            .collect();

        assert!(levels.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(
            plan.stages(),
            vec![vec![a.id()], vec![b.id()], vec![c.id()], vec![d.id()]]
        );
    }

    #[test]
    fn every_task_ranks_above_its_direct_dependencies() {
        let builder = TaskBuilder::new();
        let a = builder.resolver_sync(|_| Ok(1));
        let b = builder.resolver_sync(|_| Ok(2));
        let c = builder
            .depend(DepTree::new().with("x", DepTree::new().with("a", &a).with("b", &b)))
            .resolver_sync(|_| Ok(3));
        let root = builder
            .depend(DepTree::new().with("c", &c).with("b", &b))
            .resolver_sync(|_| Ok(4));

        let plan = ExecutionPlan::build(&root).unwrap();

        for id in plan.order() {
            let level = plan.level_of(*id).unwrap();
            for dep in plan.dependencies_of(*id) {
                assert!(level > plan.level_of(*dep).unwrap());
            }
        }
    }
}
