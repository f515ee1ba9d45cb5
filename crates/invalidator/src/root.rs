use crate::Error;
use std::path::PathBuf;

/// Resolve a writable build-invalidator root directory.
///
/// Resolution order (first writable candidate wins), mirroring how the
/// rest of this kind of tool resolves its cache root: an explicit
/// override, then XDG, then the OS cache dir, then a legacy home-relative
/// path, then a temp-dir fallback so the invalidator always has somewhere
/// to write even in a stripped-down CI sandbox.
pub fn discover_root() -> crate::Result<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(dir) = std::env::var("KILN_INVALIDATOR_DIR") {
        if !dir.trim().is_empty() {
            candidates.push(PathBuf::from(dir));
        }
    }
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        if !xdg.trim().is_empty() {
            candidates.push(PathBuf::from(xdg).join("kiln/invalidator"));
        }
    }
    if let Some(os_cache) = dirs::cache_dir() {
        candidates.push(os_cache.join("kiln/invalidator"));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".kiln/invalidator"));
    }
    candidates.push(std::env::temp_dir().join("kiln/invalidator"));

    for path in candidates {
        if path.exists() {
            let probe = path.join(".write_probe");
            if std::fs::write(&probe, b"").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return Ok(path);
            }
            continue;
        }
        if std::fs::create_dir_all(&path).is_ok() {
            return Ok(path);
        }
    }

    Err(Error::NoWritableRoot)
}
