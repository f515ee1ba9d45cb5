use crate::ArtifactCache;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads fall through an ordered list of tiers; writes fan out to all of
/// them. Typical composition: a local filesystem cache in front of a
/// remote HTTP cache, so a hit in the fast local tier never waits on the
/// network.
pub struct CombinedArtifactCache {
    tiers: Vec<Box<dyn ArtifactCache>>,
}

impl CombinedArtifactCache {
    /// Compose `tiers` in read-fallthrough order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NoTiers`] if `tiers` is empty.
    pub fn new(tiers: Vec<Box<dyn ArtifactCache>>) -> crate::Result<Self> {
        if tiers.is_empty() {
            return Err(crate::Error::NoTiers);
        }
        Ok(Self { tiers })
    }
}

#[async_trait]
impl ArtifactCache for CombinedArtifactCache {
    async fn has(&self, key: &str) -> bool {
        for tier in &self.tiers {
            if tier.has(key).await {
                return true;
            }
        }
        false
    }

    async fn use_cached_files(&self, key: &str, dest_root: &Path) -> bool {
        for (i, tier) in self.tiers.iter().enumerate() {
            if tier.use_cached_files(key, dest_root).await {
                if i > 0 {
                    let materialized = list_files(dest_root);
                    for earlier in &self.tiers[..i] {
                        earlier.insert(key, &materialized).await;
                    }
                }
                return true;
            }
        }
        false
    }

    async fn insert(&self, key: &str, file_paths: &[PathBuf]) {
        for tier in &self.tiers {
            tier.insert(key, file_paths).await;
        }
    }
}

/// Files materialized directly under `dir`, for writing a tier hit back
/// through to the faster tiers that missed it.
fn list_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalArtifactCache;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn empty_tiers_is_an_error() {
        assert!(matches!(CombinedArtifactCache::new(vec![]), Err(crate::Error::NoTiers)));
    }

    #[tokio::test]
    async fn hit_in_second_tier_is_found() {
        let front_root = TempDir::new().unwrap();
        let front = LocalArtifactCache::new(front_root.path().to_path_buf());
        let back_root = TempDir::new().unwrap();
        let back = LocalArtifactCache::new(back_root.path().to_path_buf());

        let src = TempDir::new().unwrap();
        let f = write_file(src.path(), "out.bin", b"from-back-tier");
        back.insert("k1", std::slice::from_ref(&f)).await;

        let combined = CombinedArtifactCache::new(vec![Box::new(front), Box::new(back)]).unwrap();
        assert!(combined.has("k1").await);

        let dest = TempDir::new().unwrap();
        assert!(combined.use_cached_files("k1", dest.path()).await);
        assert_eq!(std::fs::read(dest.path().join("out.bin")).unwrap(), b"from-back-tier");

        // The front tier missed, so the hit from the back tier must have been
        // written through to it.
        let front_check = LocalArtifactCache::new(front_root.path().to_path_buf());
        assert!(front_check.has("k1").await);
        let front_dest = TempDir::new().unwrap();
        assert!(front_check.use_cached_files("k1", front_dest.path()).await);
        assert_eq!(std::fs::read(front_dest.path().join("out.bin")).unwrap(), b"from-back-tier");
    }

    #[tokio::test]
    async fn miss_in_every_tier_is_false() {
        let a = LocalArtifactCache::new(TempDir::new().unwrap().into_path());
        let b = LocalArtifactCache::new(TempDir::new().unwrap().into_path());
        let combined = CombinedArtifactCache::new(vec![Box::new(a), Box::new(b)]).unwrap();

        assert!(!combined.has("missing").await);
        let dest = TempDir::new().unwrap();
        assert!(!combined.use_cached_files("missing", dest.path()).await);
    }

    #[tokio::test]
    async fn insert_fans_out_to_every_tier() {
        let a_root = TempDir::new().unwrap();
        let b_root = TempDir::new().unwrap();
        let a = LocalArtifactCache::new(a_root.path().to_path_buf());
        let b = LocalArtifactCache::new(b_root.path().to_path_buf());

        let src = TempDir::new().unwrap();
        let f = write_file(src.path(), "out.bin", b"fan-out");

        {
            let combined = CombinedArtifactCache::new(vec![Box::new(a), Box::new(b)]).unwrap();
            combined.insert("k2", std::slice::from_ref(&f)).await;
        }

        let a_check = LocalArtifactCache::new(a_root.path().to_path_buf());
        let b_check = LocalArtifactCache::new(b_root.path().to_path_buf());
        assert!(a_check.has("k2").await);
        assert!(b_check.has("k2").await);
    }
}
