use crate::message::MessageElement;
use crate::reporter::Reporter;
use kiln_workunit::{WorkUnit, WorkUnitId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct ReportState {
    workunits: HashMap<WorkUnitId, Arc<WorkUnit>>,
    reporters: Vec<Box<dyn Reporter>>,
}

/// The fan-out hub every work unit reports through.
///
/// Owns a single coarse mutex protecting both the live `workunit_id ->
/// WorkUnit` map and the reporter list: reporters are I/O-bound and
/// start/end rates stay far below the threshold where lock contention
/// would matter. A background task started by [`Self::open`] wakes every
/// 500 ms and drains every open work unit's output.
pub struct Report {
    state: Mutex<ReportState>,
    emitter: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Report {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ReportState { workunits: HashMap::new(), reporters: Vec::new() }),
            emitter: tokio::sync::Mutex::new(None),
        })
    }

    /// Register a reporter. Must be called before [`Self::open`].
    pub fn add_reporter(&self, reporter: Box<dyn Reporter>) {
        self.state.lock().reporters.push(reporter);
    }

    /// Open every registered reporter and start the periodic emitter.
    pub async fn open(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            for reporter in &mut state.reporters {
                reporter.open();
            }
        }
        let report = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(500));
            loop {
                interval.tick().await;
                report.flush();
            }
        });
        *self.emitter.lock().await = Some(handle);
    }

    /// Register `unit` as open and dispatch `start_workunit` to every
    /// reporter.
    pub fn start_workunit(&self, unit: Arc<WorkUnit>) {
        let mut state = self.state.lock();
        state.workunits.insert(unit.id(), Arc::clone(&unit));
        for reporter in &mut state.reporters {
            reporter.start_workunit(&unit);
        }
    }

    /// Dispatch a message to every reporter.
    pub fn message(&self, unit: &WorkUnit, elements: &[MessageElement]) {
        let mut state = self.state.lock();
        for reporter in &mut state.reporters {
            reporter.handle_message(unit, elements);
        }
    }

    /// Force a full drain (so every byte produced for `unit` before its
    /// `end()` reaches reporters first), dispatch `end_workunit`, then
    /// deregister `unit`.
    pub fn end_workunit(&self, unit: &Arc<WorkUnit>) {
        let mut state = self.state.lock();
        Self::drain_all_locked(&mut state);
        for reporter in &mut state.reporters {
            reporter.end_workunit(unit);
        }
        state.workunits.remove(&unit.id());
    }

    /// Drain every open work unit's non-empty output buffers and forward
    /// each to every reporter. Called by the periodic emitter and by
    /// [`Self::end_workunit`]/[`Self::close`].
    pub fn flush(&self) {
        let mut state = self.state.lock();
        Self::drain_all_locked(&mut state);
    }

    fn drain_all_locked(state: &mut ReportState) {
        let ReportState { workunits, reporters } = state;
        for unit in workunits.values() {
            for (label, bytes) in unit.drain_all_outputs() {
                for reporter in reporters.iter_mut() {
                    reporter.handle_output(unit, &label, &bytes);
                }
            }
        }
    }

    /// The dotted label path from the run's root to `unit`, e.g.
    /// `"all.compile.scala"`, built by walking `unit.parent()` through
    /// still-open ancestors in the workunit map.
    #[must_use]
    pub fn label_path(&self, unit: &WorkUnit) -> String {
        let state = self.state.lock();
        let mut parts = vec![unit.name().to_string()];
        let mut current = unit.parent();
        while let Some(parent_id) = current {
            match state.workunits.get(&parent_id) {
                Some(ancestor) => {
                    parts.push(ancestor.name().to_string());
                    current = ancestor.parent();
                }
                None => break,
            }
        }
        parts.reverse();
        parts.join(".")
    }

    /// Dispatch a whole-file overwrite to every reporter (see
    /// [`Reporter::overwrite_output`]).
    pub fn overwrite(&self, label: &str, bytes: &[u8]) {
        let mut state = self.state.lock();
        for reporter in &mut state.reporters {
            reporter.overwrite_output(label, bytes);
        }
    }

    /// Stop the periodic emitter, do one final drain, then close every
    /// reporter.
    pub async fn close(&self) {
        if let Some(handle) = self.emitter.lock().await.take() {
            handle.abort();
        }
        let mut state = self.state.lock();
        Self::drain_all_locked(&mut state);
        for reporter in &mut state.reporters {
            reporter.close();
        }
    }
}
