//! Content-addressed cache key generation for kiln targets.
//!
//! A [`CacheKey`] is the stable, content-derived identity the rest of the
//! core (invalidation, artifact lookup) keys everything off of. Computing
//! one never touches the filesystem directly — source digests are
//! supplied by the caller's [`Target`] implementation, keeping this crate
//! decoupled from any particular target-graph format.

mod error;
mod key;
mod target;

pub use error::{Error, Result};
pub use key::{CacheKey, combine_cache_keys, key_for_target};
pub use target::Target;
