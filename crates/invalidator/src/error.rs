//! Error types for the build invalidator.

use std::path::Path;
use thiserror::Error;

/// Error type for invalidator operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error against the persisted store.
    #[error("invalidator I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available.
        path: Option<Box<Path>>,
        /// Operation that failed (e.g. "write", "rename").
        operation: String,
    },

    /// No writable invalidator directory could be found.
    #[error("failed to determine a writable build-invalidator directory")]
    NoWritableRoot,

    /// The on-disk entry could not be parsed.
    #[error("corrupt invalidator entry: {message}")]
    Serialization {
        /// Description of the parse failure.
        message: String,
    },
}

impl Error {
    /// Build an I/O error with path context.
    #[must_use]
    pub fn io(source: std::io::Error, path: impl AsRef<Path>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }
}

/// Result type for invalidator operations.
pub type Result<T> = std::result::Result<T, Error>;
