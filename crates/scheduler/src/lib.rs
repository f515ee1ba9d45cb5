//! A fixed-concurrency worker pool: async fan-out, chained sequential
//! submission, blocking submission, and a drain-then-hooks shutdown.
//!
//! Grounded in the same shape as a typical `tokio::task::JoinSet`-based
//! fan-out executor, generalized to the three submission modes
//! (`submit_async`/`submit_chain`/`submit_sync`) and the pending-chain
//! counter a plain `JoinSet` fan-out doesn't need.

mod error;
mod pool;
mod work;

pub use error::{Error, Result};
pub use pool::WorkerPool;
pub use work::{Work, WorkChain, WorkError, WorkFn};
