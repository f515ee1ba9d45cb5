//! Error type for the `kiln` demo binary.
//!
//! This crate faces a human at a terminal, so unlike the library crates it
//! wires together (which all use bare `thiserror`), it reports through
//! `miette` the way `cuenv-cli`/`cuenv-cache` do.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors the demo binary can surface, each wrapping a lower-crate error or
/// describing a failure specific to the wiring itself.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Propagated from `kiln-fingerprint`.
    #[error(transparent)]
    #[diagnostic(code(kiln::cli::fingerprint))]
    Fingerprint(#[from] kiln_fingerprint::Error),

    /// Propagated from `kiln-invalidator`.
    #[error(transparent)]
    #[diagnostic(code(kiln::cli::invalidator))]
    Invalidator(#[from] kiln_invalidator::Error),

    /// Propagated from `kiln-task-graph`.
    #[error(transparent)]
    #[diagnostic(code(kiln::cli::task_graph))]
    TaskGraph(#[from] kiln_task_graph::Error),

    /// Propagated from `kiln-cache-manager`.
    #[error(transparent)]
    #[diagnostic(code(kiln::cli::cache_manager))]
    CacheManager(#[from] kiln_cache_manager::Error),

    /// Propagated from `kiln-report`.
    #[error(transparent)]
    #[diagnostic(code(kiln::cli::report))]
    Report(#[from] kiln_report::Error),

    /// Reading a demo target's source tree under `root` failed.
    #[error("reading target {target} under {}: {source}", path.display())]
    #[diagnostic(code(kiln::cli::target_io), help("pass --root pointing at a directory containing one subdirectory per target id"))]
    TargetIo {
        /// The target id being loaded.
        target: String,
        /// The path that couldn't be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// One of `--targets` wasn't found under `root` at all.
    #[error("unknown target {id}: no directory {} found under root", path.display())]
    #[diagnostic(code(kiln::cli::unknown_target))]
    UnknownTarget {
        /// The requested target id.
        id: String,
        /// The path that was expected to exist.
        path: PathBuf,
    },

    /// The toy compiler driver returned a non-zero exit code: the core
    /// treats this as task-fatal and never marks the VTS valid.
    #[error("compile of {target} failed with exit code {exit_code}")]
    #[diagnostic(code(kiln::cli::compile_failed))]
    CompileFailed {
        /// The target whose compile step failed.
        target: String,
        /// The exit code the driver returned.
        exit_code: i32,
    },

    /// The demo worker pool reported a failed submission.
    #[error(transparent)]
    #[diagnostic(code(kiln::cli::scheduler))]
    Scheduler(#[from] kiln_scheduler::Error),

    /// The reporting server's accept loop failed.
    #[error("reporting server failed: {0}")]
    #[diagnostic(code(kiln::cli::server_io))]
    ServerIo(#[source] std::io::Error),
}

/// Result type for the demo binary.
pub type Result<T> = std::result::Result<T, Error>;
