//! Error types for the run tracker and report fan-out.

use std::path::Path;
use thiserror::Error;

/// Error type for `kiln-report` operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error against `run-info` or a reporter's backing file.
    #[error("report I/O {operation} failed: {path}")]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Path that caused the error.
        path: String,
        /// Operation that failed (e.g. "write", "symlink").
        operation: String,
    },
}

impl Error {
    /// Build an I/O error with path context.
    #[must_use]
    pub fn io(source: std::io::Error, path: impl AsRef<Path>, operation: impl Into<String>) -> Self {
        Self::Io { source, path: path.as_ref().display().to_string(), operation: operation.into() }
    }
}

/// Result type for `kiln-report` operations.
pub type Result<T> = std::result::Result<T, Error>;
