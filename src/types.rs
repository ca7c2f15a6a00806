use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Strategy used to execute the closure of a root task.
///
/// - `Concurrent`: every task waits only for its direct dependencies, so
///   independent branches run in parallel (default).
/// - `Sequential`: tasks run one at a time in ascending topological level,
///   even when they share no dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Concurrent,
    Sequential,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Concurrent
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "concurrent" => Ok(ExecutionMode::Concurrent),
            "sequential" => Ok(ExecutionMode::Sequential),
            other => Err(format!(
                "invalid execution mode: {other} (expected \"concurrent\" or \"sequential\")"
            )),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Concurrent => f.write_str("concurrent"),
            ExecutionMode::Sequential => f.write_str("sequential"),
        }
    }
}
