use crate::{Outcome, WorkUnitId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// A timed, outcome-tracking node in the work-unit tree.
///
/// `WorkUnit`s form a tree via `parent`, but this type doesn't itself own
/// child pointers or a stack of "the current unit" — that bookkeeping
/// belongs to whoever is driving the tree (kiln-report's `RunTracker`).
/// A `WorkUnit` only knows its own identity, lifecycle, and output.
pub struct WorkUnit {
    id: WorkUnitId,
    parent: Option<WorkUnitId>,
    name: String,
    kind: String,
    cmd: Option<String>,
    start: SystemTime,
    state: Mutex<State>,
}

struct State {
    outcome: Outcome,
    end: Option<SystemTime>,
    outputs: HashMap<String, Vec<u8>>,
}

impl WorkUnit {
    /// Start a new work unit now. `kind` is the reporter-facing category
    /// (pants calls it `type`, e.g. `"goal"`, `"task"`); by convention a
    /// `kind` ending in `_tool` marks an external tool invocation.
    #[must_use]
    pub fn new(parent: Option<WorkUnitId>, name: impl Into<String>, kind: impl Into<String>, cmd: Option<String>) -> Self {
        Self {
            id: WorkUnitId::new(),
            parent,
            name: name.into(),
            kind: kind.into(),
            cmd,
            start: SystemTime::now(),
            state: Mutex::new(State {
                outcome: Outcome::Unknown,
                end: None,
                outputs: HashMap::new(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> WorkUnitId {
        self.id
    }

    #[must_use]
    pub fn parent(&self) -> Option<WorkUnitId> {
        self.parent
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn cmd(&self) -> Option<&str> {
        self.cmd.as_deref()
    }

    #[must_use]
    pub fn start_time(&self) -> SystemTime {
        self.start
    }

    #[must_use]
    pub fn is_tool(&self) -> bool {
        self.kind.ends_with("_tool")
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.state.lock().outcome
    }

    /// Set the outcome before exit. A callee sets `Warning` this way;
    /// `end` fills in `Failure`/`Success` automatically if nothing else
    /// has set it.
    pub fn set_outcome(&self, outcome: Outcome) {
        self.state.lock().outcome = outcome;
    }

    #[must_use]
    pub fn end_time(&self) -> Option<SystemTime> {
        self.state.lock().end
    }

    /// Elapsed time from `start` to `end` (or now, if still running).
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        let end = self.end_time().unwrap_or_else(SystemTime::now);
        end.duration_since(self.start).unwrap_or_default()
    }

    /// End this work unit: if `outcome` is still `Unknown`, resolve it to
    /// `Success`. Idempotent — a second call leaves the first `end` time
    /// in place.
    pub fn end(&self) {
        let mut state = self.state.lock();
        if state.end.is_some() {
            return;
        }
        if state.outcome == Outcome::Unknown {
            state.outcome = Outcome::Success;
        }
        state.end = Some(SystemTime::now());
    }

    /// Append bytes to this unit's `label` output stream (e.g. a
    /// compiler's stdout). Safe to call from any thread.
    pub fn append_output(&self, label: &str, bytes: &[u8]) {
        self.state.lock().outputs.entry(label.to_string()).or_default().extend_from_slice(bytes);
    }

    /// Drain and return everything appended to `label` so far, leaving
    /// the buffer empty. Returns an empty vec if `label` has never been
    /// written to.
    pub fn drain_output(&self, label: &str) -> Vec<u8> {
        self.state
            .lock()
            .outputs
            .get_mut(label)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Drain every non-empty output stream, in label-sorted order, for a
    /// periodic emitter to forward to reporters.
    #[must_use]
    pub fn drain_all_outputs(&self) -> Vec<(String, Vec<u8>)> {
        let mut state = self.state.lock();
        let mut labels: Vec<String> = state.outputs.keys().cloned().collect();
        labels.sort_unstable();
        labels
            .into_iter()
            .filter_map(|label| {
                let buf = state.outputs.get_mut(&label).map(std::mem::take)?;
                if buf.is_empty() { None } else { Some((label, buf)) }
            })
            .collect()
    }
}

/// Run `f` as a scoped unit of work: start a fresh [`WorkUnit`], run `f`
/// with a reference to it, then `end` it on every exit path — including
/// a panic, which resolves the outcome to [`Outcome::Failure`] before
/// being resumed (this function re-panics after ending the unit, it
/// doesn't swallow the panic).
///
/// This is the primitive `kiln-report`'s `RunTracker::new_work_scope`
/// builds its push/yield/pop-and-end semantics on top of.
pub fn scoped<F, R>(parent: Option<WorkUnitId>, name: impl Into<String>, kind: impl Into<String>, cmd: Option<String>, f: F) -> (WorkUnit, R)
where
    F: FnOnce(&WorkUnit) -> R,
{
    let (unit, result) = scoped_with_start(parent, name, kind, cmd, |_u| {}, f);
    (unit, result)
}

/// Like [`scoped`], but calls `on_start` with the fresh unit right after
/// it's created and before `f` runs — the hook a reporter's
/// `start_workunit` callback needs to fire at, matching the Python
/// original's "report, then yield the block" ordering in
/// `new_work_scope`.
pub fn scoped_with_start<S, F, R>(
    parent: Option<WorkUnitId>,
    name: impl Into<String>,
    kind: impl Into<String>,
    cmd: Option<String>,
    on_start: S,
    f: F,
) -> (WorkUnit, R)
where
    S: FnOnce(&WorkUnit),
    F: FnOnce(&WorkUnit) -> R,
{
    let unit = WorkUnit::new(parent, name, kind, cmd);
    on_start(&unit);
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&unit))) {
        Ok(result) => {
            unit.end();
            (unit, result)
        }
        Err(payload) => {
            unit.set_outcome(Outcome::Failure);
            unit.end();
            std::panic::resume_unwind(payload);
        }
    }
}
