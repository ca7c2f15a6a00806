// src/config/mod.rs

//! Pipeline files for the `taskgraph` binary.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a pipeline file from disk (`loader.rs`).
//! - Validate references and cycles (`validate.rs`).
//! - Build runnable tasks from a validated file (`pipeline.rs`).

pub mod loader;
pub mod model;
pub mod pipeline;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{ConfigSection, DepSpec, PipelineFile, RawPipelineFile, TaskConfig};
pub use pipeline::{build_tasks, resolve_root};
pub use validate::topological_order;
