//! Run tracking and report fan-out for a single kiln run.
//!
//! [`RunTracker`] owns the run's identity, root work unit, and aggregated
//! timings; [`Report`] is the mutex-protected fan-out hub every
//! [`Reporter`] implementation plugs into. The periodic-drain shape is a
//! `tokio::spawn`ed background task plus a coarse lock, rather than a
//! push-based broadcast channel — ordering across reporters needs a
//! pull-based drain, not fan-out delivery of arbitrary events.

mod error;
mod message;
mod report;
mod run_info;
mod run_tracker;
mod reporter;

pub use error::{Error, Result};
pub use message::MessageElement;
pub use report::Report;
pub use reporter::{ConsoleReporter, FileReporter, MultiFileReporter, Reporter, DEFAULT_OUTPUT_LABEL};
pub use run_info::RunInfo;
pub use run_tracker::RunTracker;
