//! Build artifact caches: local filesystem, remote HTTP, and ordered combinations.
//!
//! [`ArtifactCache`] is deliberately narrow and failure-tolerant: a miss,
//! a corrupt entry, or a write failure never propagate as an error up
//! into the build — they become `false`/a no-op, logged at the point of
//! failure. The core only ever needs to know "did we get the files" or
//! "we tried to save them"; a cache tier's internal reasons for saying no
//! aren't the caller's problem.

mod combined;
mod error;
mod local;
mod remote;

pub use combined::CombinedArtifactCache;
pub use error::{Error, Result};
pub use local::LocalArtifactCache;
pub use remote::RemoteArtifactCache;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A store of build outputs addressed by an opaque cache key string.
///
/// Implementations must tolerate concurrent calls for the same key: a
/// [`crate::combined`][CombinedArtifactCache] composes several tiers and
/// a worker pool may be checking and populating the same target from
/// multiple threads.
#[async_trait]
pub trait ArtifactCache: Send + Sync {
    /// Does this cache hold an entry for `key`?
    async fn has(&self, key: &str) -> bool;

    /// Materialize the cached files for `key` into `dest_root`.
    ///
    /// Returns `false` on a miss *or* a corrupt/unreadable entry — this
    /// never raises; a corrupt cache entry is equivalent to a miss from
    /// the caller's point of view, just slower to discover.
    async fn use_cached_files(&self, key: &str, dest_root: &Path) -> bool;

    /// Save `file_paths` under `key`.
    ///
    /// Best-effort: failures are logged, not propagated. A cache write
    /// failing must never fail the build that produced the output.
    async fn insert(&self, key: &str, file_paths: &[PathBuf]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct MemoryCache {
        entries: Mutex<std::collections::HashMap<String, Vec<PathBuf>>>,
    }

    #[async_trait]
    impl ArtifactCache for MemoryCache {
        async fn has(&self, key: &str) -> bool {
            self.entries.lock().unwrap().contains_key(key)
        }

        async fn use_cached_files(&self, key: &str, dest_root: &Path) -> bool {
            let Some(paths) = self.entries.lock().unwrap().get(key).cloned() else {
                return false;
            };
            for p in paths {
                let Some(name) = p.file_name() else { return false };
                if std::fs::copy(&p, dest_root.join(name)).is_err() {
                    return false;
                }
            }
            true
        }

        async fn insert(&self, key: &str, file_paths: &[PathBuf]) {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), file_paths.to_vec());
        }
    }

    #[tokio::test]
    async fn memory_cache_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("out.txt");
        std::fs::write(&src, b"hello").unwrap();

        let cache = MemoryCache::default();
        assert!(!cache.has("k1").await);

        cache.insert("k1", &[src.clone()]).await;
        assert!(cache.has("k1").await);

        let dest = tempfile::TempDir::new().unwrap();
        assert!(cache.use_cached_files("k1", dest.path()).await);
        assert_eq!(std::fs::read(dest.path().join("out.txt")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn memory_cache_miss_is_false() {
        let cache = MemoryCache::default();
        let dest = tempfile::TempDir::new().unwrap();
        assert!(!cache.use_cached_files("missing", dest.path()).await);
    }
}
