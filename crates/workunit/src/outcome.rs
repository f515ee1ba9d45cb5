/// The result of a [`crate::WorkUnit`].
///
/// Ordered worst-to-best: `Unknown < Failure < Warning < Success < Aborted`
/// is deliberately *not* a severity ordering — `Aborted` (cancelled by the
/// user, e.g. Ctrl-C) sorts after `Success` because it isn't "worse" than
/// a failure, just different. Nothing in this crate currently compares
/// outcomes; the derive is here for callers that want to roll several
/// children's outcomes into one and need some total order to do it with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Outcome {
    /// Never started, or started and never resolved to anything else.
    #[default]
    Unknown,
    /// Ended via an unhandled panic, or explicitly set to failure.
    Failure,
    /// Completed, but a callee flagged something noteworthy before exit.
    Warning,
    /// Completed without incident.
    Success,
    /// Cancelled before completion.
    Aborted,
}

impl Outcome {
    /// The string pants-style reporters expect, e.g. in `run_info`'s
    /// `outcome` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Failure => "FAILURE",
            Self::Warning => "WARNING",
            Self::Success => "SUCCESS",
            Self::Aborted => "ABORTED",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
