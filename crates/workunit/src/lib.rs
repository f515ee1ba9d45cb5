//! The work-unit tree: scoped timing/outcome tracking and output capture
//! for a single kiln run, plus cross-run aggregated timings.
//!
//! A [`WorkUnit`] only knows its own identity and lifecycle; the tree
//! structure (current-unit stack, push/pop on scope entry/exit) is
//! `kiln-report`'s `RunTracker` responsibility, built on top of
//! [`scoped`].

mod id;
mod outcome;
mod timings;
mod unit;

pub use id::WorkUnitId;
pub use outcome::Outcome;
pub use timings::{AggregatedTimings, TimingEntry};
pub use unit::{WorkUnit, scoped, scoped_with_start};
