use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// `submit_sync` re-raises when one or more invocations in the work
    /// list failed. The underlying per-invocation errors were already
    /// logged by the pool; this carries just the count, matching
    /// `submit_async`'s "error is logged, callback not invoked" contract
    /// applied to the blocking case.
    #[error("{failed} of {total} work invocations failed")]
    WorkFailed { failed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
