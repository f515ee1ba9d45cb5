//! Error types for the cache manager.

use thiserror::Error;

/// Errors that can occur building or operating on versioned target sets.
#[derive(Error, Debug)]
pub enum Error {
    /// A [`crate::VersionedTargetSet`] was constructed from VTs produced by
    /// more than one [`crate::CacheManager`], or an operation was invoked
    /// against a set it doesn't own.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Fingerprint combination failed (only possible on an empty group,
    /// which the partitioning algorithm never produces).
    #[error(transparent)]
    Fingerprint(#[from] kiln_fingerprint::Error),

    /// The persisted invalidator store failed.
    #[error(transparent)]
    Invalidator(#[from] kiln_invalidator::Error),

    /// Topological ordering of the target graph failed.
    #[error(transparent)]
    Graph(#[from] kiln_task_graph::Error),
}

/// Result type for cache-manager operations.
pub type Result<T> = std::result::Result<T, Error>;
