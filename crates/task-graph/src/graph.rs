//! Target graph builder using petgraph.
//!
//! Builds directed acyclic graphs from target definitions to determine
//! build order and concurrency opportunities.

use crate::{Error, Result, TargetNodeData};
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::IntoNodeReferences;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A node in the target graph.
#[derive(Debug, Clone)]
pub struct GraphNode<T> {
    /// Name of the target.
    pub name: String,
    /// The target data.
    pub task: T,
}

/// Target graph for dependency resolution and execution ordering.
///
/// Generic over any target type implementing [`TargetNodeData`]. Provides
/// methods for building the graph, validating it, and computing execution
/// order.
pub struct TargetGraph<T: TargetNodeData> {
    graph: DiGraph<GraphNode<T>, ()>,
    name_to_node: HashMap<String, NodeIndex>,
}

impl<T: TargetNodeData> TargetGraph<T> {
    /// Create a new empty target graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_to_node: HashMap::new(),
        }
    }

    /// Add a single target to the graph.
    ///
    /// If a target with the same name already exists, returns the existing
    /// node index without touching its data.
    ///
    /// # Errors
    ///
    /// Currently infallible, but returns `Result` for API consistency with
    /// the rest of this crate.
    pub fn add_target(&mut self, name: &str, task: T) -> Result<NodeIndex> {
        if let Some(&node) = self.name_to_node.get(name) {
            return Ok(node);
        }

        let node = GraphNode {
            name: name.to_string(),
            task,
        };

        let node_index = self.graph.add_node(node);
        self.name_to_node.insert(name.to_string(), node_index);
        debug!("added target node '{}'", name);

        Ok(node_index)
    }

    /// Get a mutable reference to a target node by index.
    pub fn get_node_mut(&mut self, index: NodeIndex) -> Option<&mut GraphNode<T>> {
        self.graph.node_weight_mut(index)
    }

    /// Get a reference to a target node by name.
    #[must_use]
    pub fn get_node_by_name(&self, name: &str) -> Option<&GraphNode<T>> {
        self.name_to_node
            .get(name)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Add a direct edge between two targets.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        self.graph.add_edge(from, to, ());
    }

    /// Add dependency edges after all targets have been added.
    ///
    /// This two-pass approach (add all nodes, then wire edges) means the
    /// order targets are added in doesn't matter for whether a forward
    /// reference resolves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDependencies`] if any target depends on a
    /// name that was never added.
    pub fn add_dependency_edges(&mut self) -> Result<()> {
        let mut missing_deps = Vec::new();
        let mut edges_to_add = Vec::new();

        for (node_index, node) in self.graph.node_references() {
            for dep_name in node.task.dependency_names() {
                if let Some(&dep_node_index) = self.name_to_node.get(dep_name) {
                    edges_to_add.push((dep_node_index, node_index));
                } else {
                    missing_deps.push((node.name.clone(), dep_name.to_string()));
                }
            }
        }

        if !missing_deps.is_empty() {
            return Err(Error::MissingDependencies {
                missing: missing_deps,
            });
        }

        for (from, to) in edges_to_add {
            self.graph.add_edge(from, to, ());
        }

        Ok(())
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Get topologically sorted list of targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn topological_sort(&self) -> Result<Vec<GraphNode<T>>> {
        if self.has_cycles() {
            return Err(Error::CycleDetected {
                message: "target dependency graph contains cycles".to_string(),
            });
        }

        match toposort(&self.graph, None) {
            Ok(sorted_indices) => Ok(sorted_indices
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(_) => Err(Error::TopologicalSortFailed {
                reason: "petgraph toposort failed".to_string(),
            }),
        }
    }

    /// Get all targets that can run in parallel, grouped by dependency
    /// level.
    ///
    /// Returns a vector of groups ordered by level: every target in group
    /// N depends only on targets in groups `< N`, so group N can't start
    /// dispatching until every earlier group has finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn get_parallel_groups(&self) -> Result<Vec<Vec<GraphNode<T>>>> {
        let sorted = self.topological_sort()?;

        if sorted.is_empty() {
            return Ok(vec![]);
        }

        let mut groups: Vec<Vec<GraphNode<T>>> = vec![];
        let mut processed: HashMap<String, usize> = HashMap::new();

        for task in sorted {
            let mut level = 0;
            for dep in task.task.dependency_names() {
                if let Some(&dep_level) = processed.get(dep) {
                    level = level.max(dep_level + 1);
                }
            }

            if level >= groups.len() {
                groups.resize(level + 1, vec![]);
            }
            groups[level].push(task.clone());
            processed.insert(task.name.clone(), level);
        }

        Ok(groups)
    }

    /// Number of targets in the graph.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if a target exists in the graph.
    #[must_use]
    pub fn contains_target(&self, name: &str) -> bool {
        self.name_to_node.contains_key(name)
    }

    /// Get the node index for a target by name.
    #[must_use]
    pub fn get_node_index(&self, name: &str) -> Option<NodeIndex> {
        self.name_to_node.get(name).copied()
    }

    /// Iterate over all nodes in the graph.
    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode<T>)> {
        self.graph.node_references()
    }

    /// Build the graph for a target and all its transitive dependencies.
    ///
    /// `get_task` looks up a target's data by name; only targets reachable
    /// from `task_name` are added.
    ///
    /// # Errors
    ///
    /// Returns an error if dependencies cannot be resolved.
    pub fn build_for_target<F>(&mut self, task_name: &str, mut get_task: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<T>,
    {
        let mut to_process = vec![task_name.to_string()];
        let mut processed = HashSet::new();

        debug!("building graph for '{}'", task_name);

        while let Some(current_name) = to_process.pop() {
            if processed.contains(&current_name) {
                continue;
            }
            processed.insert(current_name.clone());

            if let Some(task) = get_task(&current_name) {
                let deps: Vec<String> = task.dependency_names().map(String::from).collect();

                self.add_target(&current_name, task)?;

                for dep in deps {
                    if !processed.contains(&dep) {
                        to_process.push(dep);
                    }
                }
            } else {
                debug!("target '{}' not found while building graph", current_name);
            }
        }

        self.add_dependency_edges()?;

        Ok(())
    }

    /// Given a pipeline of target names and a predicate for "directly
    /// affected" (e.g. a target whose sources changed), compute the full
    /// set of affected targets: the directly affected ones plus every
    /// target that transitively depends on one, in pipeline order.
    #[must_use]
    pub fn compute_affected<F>(&self, pipeline: &[impl AsRef<str>], is_directly_affected: F) -> Vec<String>
    where
        F: Fn(&T) -> bool,
    {
        let mut affected = HashSet::new();

        for task_name in pipeline {
            let task_name = task_name.as_ref();
            if let Some(node) = self.get_node_by_name(task_name)
                && is_directly_affected(&node.task)
            {
                affected.insert(task_name.to_string());
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for task_name in pipeline {
                let task_name = task_name.as_ref();
                if affected.contains(task_name) {
                    continue;
                }

                if let Some(node) = self.get_node_by_name(task_name) {
                    for dep in node.task.dependency_names() {
                        if affected.contains(dep) {
                            affected.insert(task_name.to_string());
                            changed = true;
                            break;
                        }
                    }
                }
            }
        }

        pipeline
            .iter()
            .map(|t| t.as_ref().to_string())
            .filter(|t| affected.contains(t))
            .collect()
    }
}

impl<T: TargetNodeData> Default for TargetGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the transitive closure of dependencies from an initial set of
/// target names, given a way to look up each target's dependency names.
#[must_use]
pub fn compute_transitive_closure<'a>(
    initial: impl IntoIterator<Item = &'a str>,
    get_deps: impl Fn(&str) -> Option<&'a [String]>,
) -> HashSet<String> {
    let mut all = HashSet::new();
    let mut frontier: Vec<&str> = Vec::new();

    for name in initial {
        if all.insert(name.to_string()) {
            frontier.push(name);
        }
    }

    while let Some(task_id) = frontier.pop() {
        if let Some(deps) = get_deps(task_id) {
            for dep in deps {
                if all.insert(dep.clone()) {
                    frontier.push(dep.as_str());
                }
            }
        }
    }

    all
}
