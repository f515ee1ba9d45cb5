use thiserror::Error;

/// Error type for artifact cache operations.
///
/// This is deliberately narrow: per spec, `has`/`use_cached_files`/`insert`
/// never propagate failures into the build (a miss, a corrupt entry, and a
/// write failure all just get logged and turned into `false`/`()`). This
/// type exists for the handful of operations that *can't* sensibly degrade
/// to a boolean — constructing a cache, or the underlying `io::Error` a
/// caller may want to inspect when writing their own `ArtifactCache` impl.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error against the local filesystem tier.
    #[error("artifact cache I/O {operation} failed: {path}")]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Path that caused the error.
        path: String,
        /// Operation that failed (e.g. "create_dir_all", "copy").
        operation: String,
    },

    /// Archive (de)compression failure.
    #[error("archive error: {0}")]
    Archive(String),

    /// The remote tier's HTTP client returned an error.
    #[error("remote artifact cache request failed: {0}")]
    Remote(#[from] reqwest::Error),

    /// `CombinedArtifactCache::new` was given an empty tier list.
    #[error("combined artifact cache requires at least one tier")]
    NoTiers,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(source: std::io::Error, path: impl AsRef<std::path::Path>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.as_ref().display().to_string(),
            operation: operation.into(),
        }
    }
}
