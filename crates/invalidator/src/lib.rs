//! Persisted build-invalidation store.
//!
//! Maps a [`CacheKey`]'s `id` to the `hash` of the last key that was
//! successfully `update`d for it, so that [`BuildInvalidator::needs_update`]
//! can answer "has this target changed since we last built it?" in O(1).

mod error;
mod root;

pub use error::{Error, Result};
pub use root::discover_root;

use kiln_fingerprint::CacheKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Serialize, Deserialize)]
struct Entry {
    id: String,
    hash: String,
}

/// A key-value store on disk mapping `cache_key.id` to the `hash` of the
/// last successful [`update`][BuildInvalidator::update].
pub struct BuildInvalidator {
    root: PathBuf,
}

impl BuildInvalidator {
    /// Open (or lazily create, on first write) a store rooted at `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Open a store at the environment-resolved default root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoWritableRoot`] if no candidate directory is
    /// writable (see [`discover_root`]).
    pub fn discover() -> Result<Self> {
        Ok(Self::new(discover_root()?))
    }

    /// `true` iff `key`'s hash differs from (or has never been recorded
    /// as) the last successful update for `key.id`.
    ///
    /// If the store directory doesn't exist at all, every key needs
    /// update — this is not an error.
    #[must_use]
    pub fn needs_update(&self, key: &CacheKey) -> bool {
        match self.read_hash(&key.id) {
            Some(stored) => stored != key.hash,
            None => true,
        }
    }

    /// Atomically record `key` as the last successful update for
    /// `key.id`: write to a temp file, fsync, then rename over the real
    /// entry. The fsync closes the crash-safety gap in `CacheManager::update`:
    /// a crash between the write and the rename can never leave a torn
    /// entry, only, at worst, the old one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if any filesystem operation fails.
    pub fn update(&self, key: &CacheKey) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| Error::io(e, &self.root, "create_dir_all"))?;

        let path = self.entry_path(&key.id);
        let tmp_path = self.tmp_path(&key.id);

        let entry = Entry {
            id: key.id.clone(),
            hash: key.hash.clone(),
        };
        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| Error::Serialization { message: e.to_string() })?;

        let mut file =
            fs::File::create(&tmp_path).map_err(|e| Error::io(e, &tmp_path, "create"))?;
        file.write_all(&bytes)
            .map_err(|e| Error::io(e, &tmp_path, "write"))?;
        file.sync_all()
            .map_err(|e| Error::io(e, &tmp_path, "sync_all"))?;
        drop(file);

        fs::rename(&tmp_path, &path).map_err(|e| Error::io(e, &path, "rename"))?;
        tracing::debug!(id = %key.id, hash = %key.hash, "invalidator: recorded update");
        Ok(())
    }

    /// Remove the recorded entry for `key`, if any. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] for failures other than "already absent".
    pub fn force_invalidate(&self, key: &CacheKey) -> Result<()> {
        let path = self.entry_path(&key.id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(e, path, "remove_file")),
        }
    }

    fn read_hash(&self, id: &str) -> Option<String> {
        let path = self.entry_path(id);
        let content = fs::read_to_string(path).ok()?;
        let entry: Entry = serde_json::from_str(&content).ok()?;
        Some(entry.hash)
    }

    /// Entries are stored under a digest of the id, not the id itself, so
    /// that ids containing `/` or other path-hostile characters (target
    /// ids routinely look like `src/foo:foo`) can't escape the root or
    /// collide with directory structure.
    fn entry_path(&self, id: &str) -> PathBuf {
        self.root.join(digest_id(id))
    }

    fn tmp_path(&self, id: &str) -> PathBuf {
        self.root
            .join(format!("{}.tmp-{}", digest_id(id), std::process::id()))
    }
}

fn digest_id(id: &str) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(id.as_bytes()))
}
