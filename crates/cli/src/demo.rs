//! A toy target graph and compiler driver the demo binary exercises the
//! core against.
//!
//! Parsing a real target-graph format is out of scope for this core;
//! [`DemoTarget`] stands in for whatever a caller's own graph loader
//! would produce, and [`CompilerDriver`] stands in for an external
//! compiler driver collaborator (`compile`/`run_zinc_split`/
//! `run_zinc_merge`/(de)localize). The demo only ever needs `compile`.

use crate::error::{Error, Result};
use kiln_fingerprint::Target;
use kiln_task_graph::TargetNodeData;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A buildable unit discovered under `<root>/<id>`: every regular file in
/// that subtree is a source, digested with SHA-256.
///
/// This target carries no dependency edges of its own — the demo treats
/// every requested target as independent, since a real dependency graph
/// is exactly the piece left to the caller. Wiring real edges
/// through would just mean calling [`kiln_task_graph::TargetGraph::add_dependency_edges`]
/// after populating a richer `deps` field here; nothing else in the core
/// changes.
#[derive(Debug, Clone)]
pub struct DemoTarget {
    id: String,
    dir: PathBuf,
    sources: BTreeMap<PathBuf, String>,
}

impl DemoTarget {
    /// Load a target's sources from `<root>/<id>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTarget`] if the directory doesn't exist, or
    /// [`Error::TargetIo`] if walking it fails.
    pub fn load(id: &str, root: &Path) -> Result<Self> {
        let dir = root.join(id);
        if !dir.is_dir() {
            return Err(Error::UnknownTarget { id: id.to_string(), path: dir });
        }

        let mut sources = BTreeMap::new();
        for entry in WalkDir::new(&dir) {
            let entry = entry.map_err(|e| Error::TargetIo {
                target: id.to_string(),
                path: dir.clone(),
                source: e.into_io_error().unwrap_or_else(|| std::io::Error::other("walkdir failure")),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let bytes = std::fs::read(entry.path()).map_err(|e| Error::TargetIo {
                target: id.to_string(),
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            let digest = hex::encode(Sha256::digest(&bytes));
            sources.insert(entry.path().to_path_buf(), digest);
        }

        Ok(Self { id: id.to_string(), dir, sources })
    }

    /// The directory this target's sources were loaded from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every source path loaded, in no particular order.
    #[must_use]
    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.sources.keys().cloned().collect()
    }
}

impl Target for DemoTarget {
    fn id(&self) -> &str {
        &self.id
    }

    fn source_digests(&self) -> BTreeMap<PathBuf, String> {
        self.sources.clone()
    }
}

impl TargetNodeData for DemoTarget {
    fn dependency_names(&self) -> impl Iterator<Item = &str> {
        std::iter::empty()
    }
}

/// Stand-in for an external compiler driver interface: given a target's
/// sources, produce (or fail to produce) its classes directory.
pub trait CompilerDriver: Send + Sync {
    /// Compile `sources` into `classes_dir`. Returns the exit code the
    /// real driver would return; non-zero means the invoking target's
    /// build failed and its VTS must not be marked valid.
    fn compile(&self, sources: &[PathBuf], classes_dir: &Path) -> i32;
}

/// A driver that "compiles" by copying each source's byte count into a
/// marker file under `classes_dir` — enough to prove the wiring runs
/// end to end without needing a real toolchain on hand.
#[derive(Debug, Default)]
pub struct EchoCompilerDriver;

impl CompilerDriver for EchoCompilerDriver {
    fn compile(&self, sources: &[PathBuf], classes_dir: &Path) -> i32 {
        if std::fs::create_dir_all(classes_dir).is_err() {
            return 1;
        }
        for source in sources {
            let Ok(bytes) = std::fs::read(source) else { return 1 };
            let marker = classes_dir.join(format!(
                "{}.size",
                source.file_name().map_or_else(|| "unknown".to_string(), |n| n.to_string_lossy().into_owned())
            ));
            if std::fs::write(marker, bytes.len().to_string()).is_err() {
                return 1;
            }
        }
        0
    }
}
