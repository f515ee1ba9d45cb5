use crate::partition::partition;
use crate::{Error, Result, VersionedTarget, VersionedTargetSet};
use kiln_fingerprint::{Target, key_for_target};
use kiln_invalidator::BuildInvalidator;
use kiln_task_graph::{TargetGraph, TargetNodeData};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies which [`CacheManager`] produced a [`VersionedTarget`].
///
/// A `VersionedTarget` doesn't hold a live reference back to its manager
/// (that would tie its lifetime to the manager's and block cloning); instead
/// it carries this id, and operations that must route back to the right
/// store check it against [`CacheManager::id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagerId(u64);

impl ManagerId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn for_test(n: u64) -> Self {
        Self(n)
    }
}

/// Result of [`CacheManager::check`]: every target's [`VersionedTargetSet`]
/// alongside just the invalid subset, both partitioned the same way.
#[derive(Debug, Clone)]
pub struct InvalidationCheck {
    /// Every requested target, partitioned.
    pub all: Vec<VersionedTargetSet>,
    /// Only the partitions containing at least one invalid VT.
    pub invalid: Vec<VersionedTargetSet>,
}

/// Wraps a [`BuildInvalidator`] to produce and update [`VersionedTargetSet`]s.
pub struct CacheManager {
    id: ManagerId,
    invalidator: BuildInvalidator,
    invalidate_dependents: bool,
}

impl CacheManager {
    /// Create a manager backed by `invalidator`.
    ///
    /// `invalidate_dependents` controls whether cache keys are computed
    /// transitively (folding in dependency hashes) or per-target only.
    #[must_use]
    pub fn new(invalidator: BuildInvalidator, invalidate_dependents: bool) -> Self {
        Self {
            id: ManagerId::next(),
            invalidator,
            invalidate_dependents,
        }
    }

    /// This manager's id, for routing a [`VersionedTargetSet`] back to it.
    #[must_use]
    pub fn id(&self) -> ManagerId {
        self.id
    }

    /// Compute versioned target sets for `target_ids` within `graph`.
    ///
    /// `graph` must already contain every target in `target_ids` plus their
    /// transitive dependencies, with edges wired via
    /// [`TargetGraph::add_dependency_edges`]. Targets are processed in
    /// topological order (least-dependent first) so that each target's
    /// dependency hashes are already known when its own key is computed.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph has cycles.
    pub fn check<T>(
        &self,
        graph: &TargetGraph<T>,
        target_ids: &[String],
        partition_size_hint: Option<usize>,
    ) -> Result<InvalidationCheck>
    where
        T: TargetNodeData + Target,
    {
        let wanted: std::collections::HashSet<&str> =
            target_ids.iter().map(String::as_str).collect();

        let sorted = graph.topological_sort()?;
        let mut by_name: HashMap<String, VersionedTarget> = HashMap::new();
        let mut all_vts = Vec::new();

        for node in sorted.iter().filter(|n| wanted.contains(n.name.as_str())) {
            let dependencies: Vec<VersionedTarget> = node
                .task
                .dependency_names()
                .filter_map(|dep| by_name.get(dep).cloned())
                .collect();
            let dependency_hashes: Vec<String> =
                dependencies.iter().map(|d| d.cache_key.hash.clone()).collect();

            let cache_key =
                key_for_target(&node.task, self.invalidate_dependents, &dependency_hashes, &[]);
            let valid = !self.invalidator.needs_update(&cache_key);

            let vt = VersionedTarget {
                target_id: node.name.clone(),
                cache_key,
                valid,
                dependencies,
                manager_id: self.id,
            };
            by_name.insert(node.name.clone(), vt.clone());
            all_vts.push(vt);
        }

        let invalid_vts: Vec<VersionedTarget> =
            all_vts.iter().filter(|vt| !vt.valid).cloned().collect();

        let all = self.build_sets(all_vts, partition_size_hint)?;
        let invalid = self.build_sets(invalid_vts, partition_size_hint)?;

        Ok(InvalidationCheck { all, invalid })
    }

    fn build_sets(
        &self,
        vts: Vec<VersionedTarget>,
        partition_size_hint: Option<usize>,
    ) -> Result<Vec<VersionedTargetSet>> {
        let groups = match partition_size_hint {
            Some(hint) => partition(vts, hint),
            None => vts.into_iter().map(|vt| vec![vt]).collect(),
        };

        groups
            .into_iter()
            .map(|group| VersionedTargetSet::new(group, &self.invalidator))
            .collect()
    }

    /// Record every member of `vts`, and `vts` itself, as up to date.
    ///
    /// Caller contract: only call this after the work the set represents
    /// has actually succeeded. This is all-or-nothing at the caller level —
    /// the manager does not roll back a partial update on I/O failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if `vts` was produced by a
    /// different manager, or propagates the underlying store's I/O error.
    pub fn update(&self, vts: &mut VersionedTargetSet) -> Result<()> {
        self.check_ownership(vts)?;

        for vt in &mut vts.vts {
            self.invalidator.update(&vt.cache_key)?;
            vt.valid = true;
        }
        self.invalidator.update(&vts.combined_key)?;
        vts.valid = true;
        Ok(())
    }

    /// Mark every member of `vts`, and `vts` itself, as needing update.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if `vts` was produced by a
    /// different manager, or propagates the underlying store's I/O error.
    pub fn force_invalidate(&self, vts: &mut VersionedTargetSet) -> Result<()> {
        self.check_ownership(vts)?;

        for vt in &mut vts.vts {
            self.invalidator.force_invalidate(&vt.cache_key)?;
            vt.valid = false;
        }
        self.invalidator.force_invalidate(&vts.combined_key)?;
        vts.valid = false;
        Ok(())
    }

    fn check_ownership(&self, vts: &VersionedTargetSet) -> Result<()> {
        if vts.manager_id != self.id {
            return Err(Error::InvariantViolation(
                "VersionedTargetSet does not belong to this cache manager".into(),
            ));
        }
        Ok(())
    }
}
