// src/dag/levels.rs

//! Topological levelling.
//!
//! Levels are computed by repeated passes over the not-yet-levelled tasks: a
//! task is levelled as soon as all of its direct dependencies are, at
//! `1 + max(dependency levels)` (or `0` without dependencies). Shared
//! sub-dependencies are levelled once. A pass that makes no progress means
//! the graph contains a cycle, which is reported instead of looping.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::errors::{Result, TaskGraphError};
use crate::task::TaskId;

/// Assign a level to every task in `edges`.
///
/// `edges` lists each task of a closure with its direct dependencies. Every
/// dependency must itself be listed.
pub fn assign_levels<'a, I>(edges: I) -> Result<HashMap<TaskId, usize>>
where
    I: IntoIterator<Item = (TaskId, &'a [TaskId])>,
{
    let edges: Vec<(TaskId, &[TaskId])> = edges.into_iter().collect();
    let known: HashSet<TaskId> = edges.iter().map(|(id, _)| *id).collect();

    for (id, deps) in edges.iter() {
        if let Some(missing) = deps.iter().find(|dep| !known.contains(*dep)) {
            return Err(TaskGraphError::TaskNotFound(format!(
                "task {id} depends on {missing}, which is not part of the graph"
            )));
        }
    }

    let mut levels: HashMap<TaskId, usize> = HashMap::with_capacity(edges.len());
    let mut pass = 0usize;

    while levels.len() < edges.len() {
        pass += 1;
        let before = levels.len();

        for (id, deps) in edges.iter() {
            if levels.contains_key(id) {
                continue;
            }

            let mut max_dep: Option<usize> = None;
            let mut ready = true;
            for dep in deps.iter() {
                match levels.get(dep) {
                    Some(level) => max_dep = Some(max_dep.map_or(*level, |m| m.max(*level))),
                    None => {
                        ready = false;
                        break;
                    }
                }
            }

            if ready {
                let level = max_dep.map_or(0, |m| m + 1);
                trace!(task = %id, level, pass, "levelled task");
                levels.insert(*id, level);
            }
        }

        if levels.len() == before {
            let mut stuck: Vec<TaskId> = edges
                .iter()
                .map(|(id, _)| *id)
                .filter(|id| !levels.contains_key(id))
                .collect();
            stuck.sort();
            let names: Vec<String> = stuck.iter().map(ToString::to_string).collect();
            return Err(TaskGraphError::DagCycle(format!(
                "cyclic dependency among tasks {}",
                names.join(", ")
            )));
        }
    }

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> TaskId {
        TaskId(n)
    }

    #[test]
    fn chain_levels_increase_by_one() {
        let (a, b, c) = (id(1), id(2), id(3));
        let edges: Vec<(TaskId, Vec<TaskId>)> = vec![(c, vec![b]), (b, vec![a]), (a, vec![])];

        let levels =
            assign_levels(edges.iter().map(|(id, deps)| (*id, deps.as_slice()))).unwrap();

        assert_eq!(levels[&a], 0);
        assert_eq!(levels[&b], 1);
        assert_eq!(levels[&c], 2);
    }

    #[test]
    fn level_is_one_above_deepest_dependency() {
        // d depends on a (level 0) and c (level 2).
        let (a, b, c, d) = (id(1), id(2), id(3), id(4));
        let edges: Vec<(TaskId, Vec<TaskId>)> = vec![
            (d, vec![a, c]),
            (a, vec![]),
            (b, vec![a]),
            (c, vec![b]),
        ];

        let levels =
            assign_levels(edges.iter().map(|(id, deps)| (*id, deps.as_slice()))).unwrap();

        assert_eq!(levels[&d], 3);
    }

    #[test]
    fn cycle_is_reported_instead_of_looping() {
        let (a, b, c) = (id(1), id(2), id(3));
        let edges: Vec<(TaskId, Vec<TaskId>)> = vec![(a, vec![]), (b, vec![c]), (c, vec![b])];

        let err = assign_levels(edges.iter().map(|(id, deps)| (*id, deps.as_slice())))
            .unwrap_err();

        match err {
            TaskGraphError::DagCycle(msg) => {
                assert!(msg.contains("cyclic dependency"));
                assert!(msg.contains("#2") && msg.contains("#3"));
                assert!(!msg.contains("#1"));
            }
            other => panic!("expected DagCycle, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let a = id(1);
        let deps = [a];
        let err = assign_levels(vec![(a, &deps[..])]).unwrap_err();
        assert!(matches!(err, TaskGraphError::DagCycle(_)));
    }

    #[test]
    fn dependency_outside_the_graph_is_rejected() {
        let (a, ghost) = (id(1), id(99));
        let deps = [ghost];
        let err = assign_levels(vec![(a, &deps[..])]).unwrap_err();
        assert!(matches!(err, TaskGraphError::TaskNotFound(_)));
    }

    #[test]
    fn empty_graph_has_no_levels() {
        let levels = assign_levels(Vec::<(TaskId, &[TaskId])>::new()).unwrap();
        assert!(levels.is_empty());
    }
}
