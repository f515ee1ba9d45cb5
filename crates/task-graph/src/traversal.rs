//! Traversal result types for target graphs.

use crate::GraphNode;

/// A topologically sorted sequence of target nodes.
///
/// Dependencies always come before the targets that depend on them.
pub type TopologicalOrder<T> = Vec<GraphNode<T>>;

/// Groups of targets that can execute in parallel.
///
/// Each inner vector contains targets that have no dependencies on each
/// other and can safely execute concurrently. The outer vector is ordered
/// by dependency level - all targets in group N must complete before
/// targets in group N+1 can start.
pub type ParallelGroups<T> = Vec<Vec<GraphNode<T>>>;
