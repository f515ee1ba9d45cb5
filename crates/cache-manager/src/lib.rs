//! Versioned target sets over a content-addressed cache key + invalidator.
//!
//! [`CacheManager`] is the seam between the target graph
//! (`kiln-task-graph`) and the invalidation primitives
//! (`kiln-fingerprint`/`kiln-invalidator`): it walks a graph in topological
//! order, computes each target's [`VersionedTarget`], and groups the result
//! into [`VersionedTargetSet`]s sized against an optional source-count hint.

mod error;
mod manager;
mod partition;
mod versioned_target;

pub use error::{Error, Result};
pub use manager::{CacheManager, InvalidationCheck, ManagerId};
pub use versioned_target::{VersionedTarget, VersionedTargetSet};

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_fingerprint::Target;
    use kiln_invalidator::BuildInvalidator;
    use kiln_task_graph::{TargetGraph, TargetNodeData};
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Clone)]
    struct FakeTarget {
        id: String,
        deps: Vec<String>,
        sources: BTreeMap<PathBuf, String>,
    }

    impl FakeTarget {
        fn new(id: &str, deps: &[&str], source_count: usize) -> Self {
            let sources = (0..source_count)
                .map(|i| (PathBuf::from(format!("{id}/src{i}.rs")), format!("digest-{id}-{i}")))
                .collect();
            Self {
                id: id.to_string(),
                deps: deps.iter().map(|s| (*s).to_string()).collect(),
                sources,
            }
        }
    }

    impl Target for FakeTarget {
        fn id(&self) -> &str {
            &self.id
        }

        fn source_digests(&self) -> BTreeMap<PathBuf, String> {
            self.sources.clone()
        }
    }

    impl TargetNodeData for FakeTarget {
        fn dependency_names(&self) -> impl Iterator<Item = &str> {
            self.deps.iter().map(String::as_str)
        }
    }

    fn invalidator() -> (TempDir, BuildInvalidator) {
        let dir = TempDir::new().unwrap();
        let inv = BuildInvalidator::new(dir.path().to_path_buf());
        (dir, inv)
    }

    fn graph_with(targets: &[FakeTarget]) -> TargetGraph<FakeTarget> {
        let mut graph = TargetGraph::new();
        for t in targets {
            graph.add_target(&t.id.clone(), t.clone()).unwrap();
        }
        graph.add_dependency_edges().unwrap();
        graph
    }

    #[test]
    fn fresh_targets_are_all_invalid() {
        let (_dir, inv) = invalidator();
        let manager = CacheManager::new(inv, false);
        let targets = vec![FakeTarget::new("a", &[], 2), FakeTarget::new("b", &["a"], 1)];
        let graph = graph_with(&targets);

        let check = manager
            .check(&graph, &["a".to_string(), "b".to_string()], None)
            .unwrap();

        assert_eq!(check.all.len(), 2);
        assert_eq!(check.invalid.len(), 2);
    }

    #[test]
    fn update_then_recheck_is_valid() {
        let (_dir, inv) = invalidator();
        let manager = CacheManager::new(inv, false);
        let targets = vec![FakeTarget::new("a", &[], 2)];
        let graph = graph_with(&targets);
        let ids = vec!["a".to_string()];

        let mut check = manager.check(&graph, &ids, None).unwrap();
        assert_eq!(check.invalid.len(), 1);

        for vts in &mut check.all {
            manager.update(vts).unwrap();
        }

        let recheck = manager.check(&graph, &ids, None).unwrap();
        assert!(recheck.invalid.is_empty());
        assert!(recheck.all[0].valid);
    }

    #[test]
    fn force_invalidate_makes_target_invalid_again() {
        let (_dir, inv) = invalidator();
        let manager = CacheManager::new(inv, false);
        let targets = vec![FakeTarget::new("a", &[], 1)];
        let graph = graph_with(&targets);
        let ids = vec!["a".to_string()];

        let mut check = manager.check(&graph, &ids, None).unwrap();
        manager.update(&mut check.all[0]).unwrap();

        let mut recheck = manager.check(&graph, &ids, None).unwrap();
        assert!(recheck.all[0].valid);

        manager.force_invalidate(&mut recheck.all[0]).unwrap();
        let final_check = manager.check(&graph, &ids, None).unwrap();
        assert!(!final_check.all[0].valid);
    }

    #[test]
    fn transitive_mode_invalidates_dependents_on_dependency_change() {
        let (_dir, inv) = invalidator();
        let manager = CacheManager::new(inv, true);
        let targets = vec![FakeTarget::new("a", &[], 1), FakeTarget::new("b", &["a"], 1)];
        let graph = graph_with(&targets);
        let ids = vec!["a".to_string(), "b".to_string()];

        let mut check = manager.check(&graph, &ids, None).unwrap();
        for vts in &mut check.all {
            manager.update(vts).unwrap();
        }
        assert!(manager.check(&graph, &ids, None).unwrap().invalid.is_empty());

        // Change a's sources; b's transitive key must also go stale even
        // though b's own sources didn't change.
        let mut changed = targets;
        changed[0] = FakeTarget::new("a", &[], 3);
        let graph2 = graph_with(&changed);

        let recheck = manager.check(&graph2, &ids, None).unwrap();
        let invalid_ids: Vec<&str> = recheck
            .invalid
            .iter()
            .flat_map(VersionedTargetSet::target_ids)
            .collect();
        assert!(invalid_ids.contains(&"a"));
        assert!(invalid_ids.contains(&"b"));
    }

    #[test]
    fn non_transitive_mode_does_not_propagate_dependency_changes() {
        let (_dir, inv) = invalidator();
        let manager = CacheManager::new(inv, false);
        let targets = vec![FakeTarget::new("a", &[], 1), FakeTarget::new("b", &["a"], 1)];
        let graph = graph_with(&targets);
        let ids = vec!["a".to_string(), "b".to_string()];

        let mut check = manager.check(&graph, &ids, None).unwrap();
        for vts in &mut check.all {
            manager.update(vts).unwrap();
        }

        let mut changed = targets;
        changed[0] = FakeTarget::new("a", &[], 3);
        let graph2 = graph_with(&changed);

        let recheck = manager.check(&graph2, &ids, None).unwrap();
        let invalid_ids: Vec<&str> = recheck
            .invalid
            .iter()
            .flat_map(VersionedTargetSet::target_ids)
            .collect();
        assert!(invalid_ids.contains(&"a"));
        assert!(!invalid_ids.contains(&"b"));
    }

    #[test]
    fn partition_hint_groups_multiple_targets_into_one_set() {
        let (_dir, inv) = invalidator();
        let manager = CacheManager::new(inv, false);
        let targets = vec![
            FakeTarget::new("a", &[], 2),
            FakeTarget::new("b", &[], 2),
            FakeTarget::new("c", &[], 2),
        ];
        let graph = graph_with(&targets);
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let check = manager.check(&graph, &ids, Some(10)).unwrap();
        assert_eq!(check.all.len(), 1);
        assert_eq!(check.all[0].vts.len(), 3);
    }

    #[test]
    fn no_hint_means_one_target_per_set() {
        let (_dir, inv) = invalidator();
        let manager = CacheManager::new(inv, false);
        let targets = vec![FakeTarget::new("a", &[], 1), FakeTarget::new("b", &[], 1)];
        let graph = graph_with(&targets);
        let ids = vec!["a".to_string(), "b".to_string()];

        let check = manager.check(&graph, &ids, None).unwrap();
        assert_eq!(check.all.len(), 2);
        assert_eq!(check.all[0].vts.len(), 1);
    }

    #[test]
    fn mixed_manager_vts_rejected() {
        let (_dir1, inv1) = invalidator();
        let (_dir2, inv2) = invalidator();
        let manager1 = CacheManager::new(inv1, false);
        let manager2 = CacheManager::new(inv2, false);

        let t1 = vec![FakeTarget::new("a", &[], 1)];
        let t2 = vec![FakeTarget::new("b", &[], 1)];
        let g1 = graph_with(&t1);
        let g2 = graph_with(&t2);

        let check1 = manager1.check(&g1, &["a".to_string()], None).unwrap();
        let check2 = manager2.check(&g2, &["b".to_string()], None).unwrap();

        let mut mixed_vts = check1.all[0].vts.clone();
        mixed_vts.extend(check2.all[0].vts.clone());

        let result = VersionedTargetSet::new(mixed_vts, &BuildInvalidator::new(
            TempDir::new().unwrap().path().to_path_buf(),
        ));
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn update_on_wrong_manager_is_rejected() {
        let (_dir1, inv1) = invalidator();
        let (_dir2, inv2) = invalidator();
        let manager1 = CacheManager::new(inv1, false);
        let manager2 = CacheManager::new(inv2, false);

        let targets = vec![FakeTarget::new("a", &[], 1)];
        let graph = graph_with(&targets);
        let mut check = manager1.check(&graph, &["a".to_string()], None).unwrap();

        let result = manager2.update(&mut check.all[0]);
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }
}
