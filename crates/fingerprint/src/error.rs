//! Error types for cache key generation.

use thiserror::Error;

/// Error type for fingerprint operations.
#[derive(Error, Debug)]
pub enum Error {
    /// `combine_cache_keys` was called with no inputs.
    #[error("cannot combine zero cache keys")]
    EmptyCombineInput,
}

/// Result type for fingerprint operations.
pub type Result<T> = std::result::Result<T, Error>;
