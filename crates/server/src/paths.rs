//! Path resolution shared by `/browse`, `/content`, and `/assets`.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Resolve `relpath` under `root`, rejecting any path that would escape it.
///
/// Ports `_handle_browse`'s `os.path.normpath(os.path.join(root, relpath))`
/// plus `abspath.startswith(root)` check. Rather than normalizing a joined
/// path string (which can't distinguish `..` from a sibling directory that
/// merely shares a prefix, e.g. `/root` vs `/root-other`), this walks
/// `relpath`'s components directly: `ParentDir` is rejected outright, so
/// the resolved path can never climb above `root` regardless of whether
/// `root` exists or is itself canonicalized.
pub fn resolve_within(root: &Path, relpath: &str) -> Result<PathBuf> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(relpath).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PathEscape { path: relpath.to_string() });
            }
        }
    }
    Ok(resolved)
}
