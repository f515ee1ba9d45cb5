use crate::ArtifactCache;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Filesystem-backed artifact cache.
///
/// Each entry is a single zstd-compressed tar archive named after a
/// digest of the cache key, containing the basenames of the files it was
/// given — the interface takes a flat `file_paths` list rather than a
/// root-relative tree, so directory structure beyond the filename isn't
/// preserved across a cache round-trip.
pub struct LocalArtifactCache {
    root: PathBuf,
}

impl LocalArtifactCache {
    /// Open (lazily creating, on first write) a cache rooted at `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn archive_path(&self, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.root.join(format!("{digest}.tar.zst"))
    }
}

#[async_trait]
impl ArtifactCache for LocalArtifactCache {
    async fn has(&self, key: &str) -> bool {
        self.archive_path(key).is_file()
    }

    async fn use_cached_files(&self, key: &str, dest_root: &Path) -> bool {
        let path = self.archive_path(key);
        match extract(&path, dest_root) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(key, error = %e, "local artifact cache miss or corrupt entry");
                false
            }
        }
    }

    async fn insert(&self, key: &str, file_paths: &[PathBuf]) {
        let path = self.archive_path(key);
        if let Err(e) = archive(&path, file_paths) {
            tracing::warn!(key, error = %e, "failed to write local artifact cache entry");
            let _ = std::fs::remove_file(&path);
        }
    }
}

fn archive(dst: &Path, file_paths: &[PathBuf]) -> crate::Result<()> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| crate::Error::io(e, parent, "create_dir_all"))?;
    }
    let tmp = dst.with_extension("tar.zst.tmp");
    let file = std::fs::File::create(&tmp).map_err(|e| crate::Error::io(e, &tmp, "create"))?;
    let enc = zstd::Encoder::new(file, 3).map_err(|e| crate::Error::Archive(e.to_string()))?;
    let mut builder = tar::Builder::new(enc);

    for path in file_paths {
        let Some(name) = path.file_name() else {
            continue;
        };
        builder
            .append_path_with_name(path, name)
            .map_err(|e| crate::Error::io(e, path, "tar append"))?;
    }

    let enc = builder
        .into_inner()
        .map_err(|e| crate::Error::io(e, &tmp, "tar finish"))?;
    enc.finish().map_err(|e| crate::Error::Archive(e.to_string()))?;

    std::fs::rename(&tmp, dst).map_err(|e| crate::Error::io(e, dst, "rename"))?;
    Ok(())
}

fn extract(src: &Path, dest_root: &Path) -> crate::Result<()> {
    let file = std::fs::File::open(src).map_err(|e| crate::Error::io(e, src, "open"))?;
    let dec = zstd::Decoder::new(file).map_err(|e| crate::Error::Archive(e.to_string()))?;
    let mut archive = tar::Archive::new(dec);
    std::fs::create_dir_all(dest_root).map_err(|e| crate::Error::io(e, dest_root, "create_dir_all"))?;
    archive
        .unpack(dest_root)
        .map_err(|e| crate::Error::io(e, dest_root, "unpack"))?;
    Ok(())
}
