//! Error types for the reporting server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for reporting-server operations, mapped onto an HTTP status
/// code per kind.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A `/browse` or `/content` path resolved outside the configured root.
    #[error("path escapes configured root: {path}")]
    #[diagnostic(code(kiln::server::path_escape), help("remove any `..` segments from the path"))]
    PathEscape {
        /// The offending relative path, as requested.
        path: String,
    },

    /// The client's IP is not on the allow-list.
    #[error("client {client} is not in the allowed-clients list")]
    #[diagnostic(code(kiln::server::forbidden_client))]
    ForbiddenClient {
        /// The rejected client's address.
        client: String,
    },

    /// The requested file or directory does not exist.
    #[error("not found: {path}")]
    #[diagnostic(code(kiln::server::not_found))]
    NotFound {
        /// The path that was not found.
        path: String,
    },

    /// An I/O error against the filesystem being served.
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(code(kiln::server::io))]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available.
        path: Option<Box<Path>>,
        /// Operation that failed (e.g. "read", "read_dir").
        operation: String,
    },
}

impl Error {
    /// Build an I/O error with path context.
    #[must_use]
    pub fn io(source: std::io::Error, path: impl AsRef<Path>, operation: impl Into<String>) -> Self {
        Self::Io { source, path: Some(path.as_ref().into()), operation: operation.into() }
    }
}

/// Result type for reporting-server operations.
pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::PathEscape { .. } => StatusCode::BAD_REQUEST,
            Self::ForbiddenClient { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
