use crate::error::{Error, Result};
use crate::message::MessageElement;
use crate::report::Report;
use crate::run_info::RunInfo;
use kiln_workunit::{AggregatedTimings, Outcome, WorkUnit, WorkUnitId};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::symlink;
#[cfg(windows)]
use std::os::windows::fs::symlink_file as symlink;

/// Tracks and times the execution of one kiln run: owns the root work
/// unit, the run's aggregated timings, and the [`Report`] every reporter
/// hangs off of.
///
/// Unlike `run_tracker.py`'s `_current_workunit`, which is a per-OS-thread
/// implicit stack, [`Self::new_work_scope`] takes its parent explicitly —
/// the same adaptation `kiln-scheduler`'s `WorkerPool` already makes for
/// background work (a fixed `parent_unit` field instead of a thread-local
/// current-unit pointer), since async tasks don't have the one-task-per-
/// OS-thread correspondence the original relies on. Callers thread a
/// `WorkUnitId` through instead of relying on hidden ambient state.
pub struct RunTracker {
    run_id: String,
    run_info: parking_lot::Mutex<RunInfo>,
    aggregated_timings: Arc<AggregatedTimings>,
    report: Arc<Report>,
    root: Arc<WorkUnit>,
}

impl RunTracker {
    /// Start a new run: generate `run_id`, write the run-info file,
    /// rewrite `latest.info` to point at it, open `reporters` against a
    /// fresh [`Report`], and start the root work unit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the info directory can't be created or
    /// written, or if the `latest.info` symlink can't be rewritten.
    pub async fn new(info_dir: &Path, cmd_line: impl Into<String>, reporters: Vec<Box<dyn crate::reporter::Reporter>>) -> Result<Self> {
        let now = chrono::Local::now();
        let millis = now.timestamp_subsec_millis();
        let run_id = format!("pants_run_{}_{millis:03}", now.format("%Y_%m_%d_%H_%M_%S"));

        fs::create_dir_all(info_dir).map_err(|e| Error::io(e, info_dir, "create_dir_all"))?;

        let run_info_path = info_dir.join(format!("{run_id}.info"));
        let mut run_info = RunInfo::new(run_info_path.clone());
        run_info.insert_all([
            ("id", run_id.clone()),
            ("timestamp", now.timestamp().to_string()),
            ("cmd_line", cmd_line.into()),
        ])?;

        Self::relink_latest(info_dir, &run_info_path)?;

        let report = Report::new();
        for reporter in reporters {
            report.add_reporter(reporter);
        }
        report.open().await;

        let root = Arc::new(WorkUnit::new(None, "all", "root", None));
        report.start_workunit(Arc::clone(&root));

        Ok(Self { run_id, run_info: parking_lot::Mutex::new(run_info), aggregated_timings: Arc::new(AggregatedTimings::new()), report, root })
    }

    /// Atomically point `latest.info` at `target`: unlink the existing
    /// symlink (if any), then create a fresh one. A plain overwrite isn't
    /// available for symlinks, so this is the closest the filesystem
    /// allows to an atomic rewrite — a crash between the two leaves
    /// `latest.info` absent rather than stale, which callers already have
    /// to tolerate: the run-info `outcome` field itself may be absent
    /// after an unclean exit.
    fn relink_latest(info_dir: &Path, target: &Path) -> Result<()> {
        let link_path = info_dir.join("latest.info");
        if link_path.exists() || link_path.is_symlink() {
            fs::remove_file(&link_path).map_err(|e| Error::io(e, &link_path, "remove_file"))?;
        }
        symlink(target, &link_path).map_err(|e| Error::io(e, &link_path, "symlink"))
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    #[must_use]
    pub fn root_id(&self) -> WorkUnitId {
        self.root.id()
    }

    #[must_use]
    pub fn report(&self) -> &Arc<Report> {
        &self.report
    }

    #[must_use]
    pub fn aggregated_timings(&self) -> &Arc<AggregatedTimings> {
        &self.aggregated_timings
    }

    /// Report a message against `unit`.
    pub fn message(&self, unit: &WorkUnit, elements: &[MessageElement]) {
        self.report.message(unit, elements);
    }

    /// The only supported way to create a work unit: runs `f` inside a
    /// fresh child of `parent`, reporting its start before `f` runs and
    /// its end (after draining its output and aggregating its timing)
    /// once `f` returns or panics.
    ///
    /// On a panicking `f`, the outcome resolves to [`Outcome::Failure`]
    /// before the panic is re-propagated — callers only need to set
    /// [`Outcome::Warning`] explicitly; failure and success are handled
    /// for them, matching `new_work_scope`'s contract.
    pub fn new_work_scope<F, R>(&self, parent: WorkUnitId, name: impl Into<String>, kind: impl Into<String>, cmd: Option<String>, f: F) -> R
    where
        F: FnOnce(&WorkUnit) -> R,
    {
        let unit = Arc::new(WorkUnit::new(Some(parent), name, kind, cmd));
        self.report.start_workunit(Arc::clone(&unit));

        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&unit))) {
            Ok(result) => {
                unit.end();
                self.finish_unit(&unit);
                result
            }
            Err(payload) => {
                unit.set_outcome(Outcome::Failure);
                unit.end();
                self.finish_unit(&unit);
                std::panic::resume_unwind(payload);
            }
        }
    }

    fn finish_unit(&self, unit: &Arc<WorkUnit>) {
        let label = self.report.label_path(unit);
        self.aggregated_timings.add_timing(&label, unit.elapsed(), unit.is_tool());
        self.report.end_workunit(unit);
    }

    /// End the run: end and report the root work unit, close every
    /// reporter, and best-effort record the root's outcome in run-info.
    ///
    /// The outcome write is best-effort because a `clean-all`-style goal
    /// may have already removed `info_dir`; readers of run-info must
    /// already tolerate a missing `outcome` key.
    pub async fn close(&self) {
        self.root.end();
        self.finish_unit(&self.root);

        let summary = render_aggregated_timings(&self.aggregated_timings);
        self.report.overwrite("aggregated_timings", summary.as_bytes());

        self.report.close().await;

        let outcome = self.root.outcome();
        let _ = self.run_info.lock().insert("outcome", outcome.as_str());
    }
}

/// Render `get_all()` as plain text, one `label: seconds (tool)?` line
/// per entry, descending by duration — the shape `reporter.py`'s
/// `format_aggregated_timings` produces, minus HTML.
fn render_aggregated_timings(timings: &AggregatedTimings) -> String {
    let mut out = String::new();
    for entry in timings.get_all() {
        if entry.is_tool {
            out.push_str(&format!("{}: {:.3}s (tool)\n", entry.label, entry.timing.as_secs_f64()));
        } else {
            out.push_str(&format!("{}: {:.3}s\n", entry.label, entry.timing.as_secs_f64()));
        }
    }
    out
}
