//! Error types for target graph operations.

use thiserror::Error;

/// Result type for target graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during target graph operations.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A dependency cycle was detected in the graph.
    #[error("cycle detected in target graph: {message}")]
    CycleDetected {
        /// Human-readable description of the cycle.
        message: String,
    },

    /// One or more targets depend on a target that doesn't exist.
    #[error(
        "missing dependencies: {}",
        missing.iter().map(|(target, dep)| format!("'{target}' depends on missing target '{dep}'")).collect::<Vec<_>>().join(", ")
    )]
    MissingDependencies {
        /// List of (target, missing_dependency) pairs.
        missing: Vec<(String, String)>,
    },

    /// Failed to perform topological sort.
    #[error("failed to sort targets topologically: {reason}")]
    TopologicalSortFailed {
        /// Reason for the failure.
        reason: String,
    },
}
