// src/dag/mod.rs

//! Execution closures and topological levelling.
//!
//! - [`graph`] flattens dependency trees and builds the per-root closure
//!   arena (`TaskId` -> task, with id edges).
//! - [`levels`] assigns topological levels and detects cycles.
//! - [`plan`] combines both into the [`ExecutionPlan`] handed to schedulers.

pub mod graph;
pub mod levels;
pub mod plan;

pub use graph::{TaskGraph, flatten};
pub use levels::assign_levels;
pub use plan::ExecutionPlan;
