use std::collections::BTreeMap;
use std::path::PathBuf;

/// A buildable unit of code: a library, test, or binary with sources.
///
/// Loading and parsing the target graph itself is outside the core's
/// scope; this trait is the seam a caller's target-graph implementation
/// plugs into.
pub trait Target {
    /// A stable string naming this target (e.g. `src/foo:foo`).
    fn id(&self) -> &str;

    /// Content digest (hex-encoded) of every source file this target owns
    /// directly, keyed by a path stable enough to sort on. Computing the
    /// digest itself (reading the file, hashing) is the caller's job:
    /// this core only ever consumes already-computed digests.
    fn source_digests(&self) -> BTreeMap<PathBuf, String>;
}
