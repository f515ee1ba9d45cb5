use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// One row of [`AggregatedTimings::get_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimingEntry {
    /// Dotted path from root, e.g. `all.compile.scala`.
    pub label: String,
    /// Total accumulated time for this label.
    pub timing: Duration,
    /// Whether `label` was ever recorded via a `_tool`-suffixed kind.
    pub is_tool: bool,
}

/// Additive timing totals keyed by dotted label, across however many
/// separate [`crate::WorkUnit`]s share that label.
///
/// Mirrors pants' `AggregatedTimings`: useful for finding bottlenecks
/// across repeated invocations of "the same" work, not just one run's
/// tree.
#[derive(Default)]
pub struct AggregatedTimings {
    totals: Mutex<HashMap<String, Duration>>,
    tool_labels: Mutex<std::collections::HashSet<String>>,
}

impl AggregatedTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `duration` to `label`'s running total. `is_tool` marks the
    /// label as a tool invocation for reporters that want to break those
    /// out separately; once a label is marked, it stays marked.
    pub fn add_timing(&self, label: &str, duration: Duration, is_tool: bool) {
        *self.totals.lock().entry(label.to_string()).or_default() += duration;
        if is_tool {
            self.tool_labels.lock().insert(label.to_string());
        }
    }

    /// All recorded labels, sorted by total duration descending.
    #[must_use]
    pub fn get_all(&self) -> Vec<TimingEntry> {
        let totals = self.totals.lock();
        let tool_labels = self.tool_labels.lock();
        let mut entries: Vec<TimingEntry> = totals
            .iter()
            .map(|(label, &timing)| TimingEntry {
                label: label.clone(),
                timing,
                is_tool: tool_labels.contains(label),
            })
            .collect();
        entries.sort_by(|a, b| b.timing.cmp(&a.timing));
        entries
    }
}
