use crate::{Error, ManagerId, Result};
use kiln_fingerprint::{CacheKey, combine_cache_keys};
use kiln_invalidator::BuildInvalidator;

/// A target paired with the cache key computed for it and whether that key
/// is still valid against the persisted invalidator store.
///
/// Owned by the [`crate::CacheManager`] that produced it — `manager_id` is
/// the back-edge spec'd for routing `update`/`force_invalidate` calls back
/// to the right store, tracked as an id rather than a live reference so a
/// `VersionedTarget` can be freely cloned and stored without borrowing its
/// manager.
#[derive(Debug, Clone)]
pub struct VersionedTarget {
    /// Stable id of the target this VT describes.
    pub target_id: String,
    /// The cache key computed for this target.
    pub cache_key: CacheKey,
    /// Whether `cache_key` matches the last successfully recorded update.
    pub valid: bool,
    /// Direct dependencies, in the order they were consumed while computing
    /// `cache_key` (topological order).
    pub dependencies: Vec<VersionedTarget>,
    pub(crate) manager_id: ManagerId,
}

/// An ordered group of [`VersionedTarget`]s plus their combined cache key.
///
/// All members must have been produced by the same [`crate::CacheManager`];
/// [`VersionedTargetSet::new`] rejects a mixed group with
/// [`Error::InvariantViolation`].
#[derive(Debug, Clone)]
pub struct VersionedTargetSet {
    /// Members, in topological order.
    pub vts: Vec<VersionedTarget>,
    /// `combine_cache_keys` over every member's cache key.
    pub combined_key: CacheKey,
    /// `!invalidator.needs_update(combined_key)` at construction time.
    pub valid: bool,
    pub(crate) manager_id: ManagerId,
}

impl VersionedTargetSet {
    /// Build a VTS from a non-empty, same-manager group of VTs, computing
    /// the combined key and its validity against `invalidator`.
    ///
    /// A single-VT set behaves identically to its VT: the combined key over
    /// one key sorts to that key's own hash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] if `vts` is empty or its
    /// members come from more than one cache manager.
    pub fn new(vts: Vec<VersionedTarget>, invalidator: &BuildInvalidator) -> Result<Self> {
        let manager_id = vts
            .first()
            .ok_or_else(|| Error::InvariantViolation("cannot build a VTS from zero VTs".into()))?
            .manager_id;

        if vts.iter().any(|v| v.manager_id != manager_id) {
            return Err(Error::InvariantViolation(
                "VersionedTargetSet members originate from different cache managers".into(),
            ));
        }

        let keys: Vec<CacheKey> = vts.iter().map(|v| v.cache_key.clone()).collect();
        let combined_key = combine_cache_keys(&keys)?;
        let valid = !invalidator.needs_update(&combined_key);

        Ok(Self {
            vts,
            combined_key,
            valid,
            manager_id,
        })
    }

    /// Target ids of every member, in order.
    #[must_use]
    pub fn target_ids(&self) -> Vec<&str> {
        self.vts.iter().map(|v| v.target_id.as_str()).collect()
    }
}
