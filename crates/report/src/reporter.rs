use crate::message::MessageElement;
use kiln_workunit::WorkUnit;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

/// Formats and emits reports.
///
/// Every method has a no-op default, matching `report.py`'s `Reporter`
/// base class (every callback body is `pass`) — concrete reporters
/// override only the callbacks they care about. [`Report`][crate::Report]
/// calls every registered reporter's methods while holding its own
/// coarse lock, so implementations don't need their own synchronization.
pub trait Reporter: Send {
    /// Begin the report.
    fn open(&mut self) {}
    /// End the report.
    fn close(&mut self) {}
    /// Enter a new work unit.
    fn start_workunit(&mut self, _unit: &WorkUnit) {}
    /// Exit a work unit.
    fn end_workunit(&mut self, _unit: &WorkUnit) {}
    /// Emit a message reported by build logic.
    fn handle_message(&mut self, _unit: &WorkUnit, _elements: &[MessageElement]) {}
    /// Emit output captured from an invoked tool, or internal logging.
    ///
    /// `label` classifies the output (`"stdout"`/`"stderr"` for a
    /// captured tool stream, `"output"` for kiln's own direct writes).
    fn handle_output(&mut self, _unit: &WorkUnit, _label: &str, _bytes: &[u8]) {}
    /// Whole-file replace of previously emitted content under `label`.
    ///
    /// `ConsoleReporter`/`FileReporter` leave this a no-op, same as the
    /// original's `reporter.py` (whose own TODO reads "what does
    /// overwriting mean in this context?" for streaming targets);
    /// `MultiFileReporter` is the one reporter where "a file" is a
    /// meaningful, independently addressable unit, so it's the one that
    /// implements it — used for rewriting an aggregated-timings summary
    /// in place rather than appending to it forever.
    fn overwrite_output(&mut self, _label: &str, _bytes: &[u8]) {}
}

/// Writes every callback's output straight to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn start_workunit(&mut self, unit: &WorkUnit) {
        println!("[{}] {} starting", unit.kind(), unit.name());
    }

    fn end_workunit(&mut self, unit: &WorkUnit) {
        println!("[{}] {} {}", unit.kind(), unit.name(), unit.outcome());
    }

    fn handle_message(&mut self, _unit: &WorkUnit, elements: &[MessageElement]) {
        let text: Vec<String> = elements.iter().map(MessageElement::render).collect();
        println!("{}", text.join(" "));
    }

    fn handle_output(&mut self, _unit: &WorkUnit, _label: &str, bytes: &[u8]) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(bytes);
        let _ = stdout.flush();
    }
}

/// Merges all output, for all work units and labels, into one file.
///
/// Flushes on every write — the original's comment is blunt about why:
/// "we must flush in the same thread as the write", since a reader (a
/// `tail -f`-style viewer, or `kiln-server`) may be watching the file
/// concurrently.
pub struct FileReporter {
    path: PathBuf,
    file: Option<File>,
}

impl FileReporter {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path, file: None }
    }

    fn write(&mut self, bytes: &[u8]) {
        let Some(file) = self.file.as_mut() else { return };
        if let Err(e) = file.write_all(bytes).and_then(|()| file.flush()) {
            tracing::error!(error = %e, path = %self.path.display(), "FileReporter: write failed");
        }
    }
}

impl Reporter for FileReporter {
    fn open(&mut self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::error!(error = %e, path = %parent.display(), "FileReporter: failed to create directory");
                return;
            }
        }
        match File::create(&self.path) {
            Ok(file) => self.file = Some(file),
            Err(e) => tracing::error!(error = %e, path = %self.path.display(), "FileReporter: failed to open"),
        }
    }

    fn close(&mut self) {
        self.file = None;
    }

    fn handle_message(&mut self, _unit: &WorkUnit, elements: &[MessageElement]) {
        let text: Vec<String> = elements.iter().map(MessageElement::render).collect();
        let mut line = text.join(" ");
        line.push('\n');
        self.write(line.as_bytes());
    }

    fn handle_output(&mut self, _unit: &WorkUnit, _label: &str, bytes: &[u8]) {
        self.write(bytes);
    }
}

/// Default label for output that doesn't need its own file.
pub const DEFAULT_OUTPUT_LABEL: &str = "build.html";

/// Routes output to `<dir>/<workunit.id>.<label>`, one file per
/// (work unit, label) pair; the default label lands in `build.html`.
pub struct MultiFileReporter {
    dir: PathBuf,
    files: HashMap<PathBuf, File>,
}

impl MultiFileReporter {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, files: HashMap::new() }
    }

    fn make_path(&self, unit: Option<&WorkUnit>, label: &str) -> PathBuf {
        let file_name = if label.is_empty() {
            DEFAULT_OUTPUT_LABEL.to_string()
        } else {
            match unit {
                Some(unit) => format!("{}.{}", unit.id(), label),
                None => label.to_string(),
            }
        };
        self.dir.join(file_name)
    }

    fn handle(&mut self, unit: Option<&WorkUnit>, label: &str, bytes: &[u8]) {
        if !self.dir.exists() {
            // Most likely a `clean-all` removed the run's info dir out from
            // under us mid-run; drop the write rather than erroring.
            return;
        }
        let path = self.make_path(unit, label);
        let file = match self.files.entry(path.clone()) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => match File::create(&path) {
                Ok(file) => entry.insert(file),
                Err(e) => {
                    tracing::error!(error = %e, path = %path.display(), "MultiFileReporter: failed to open");
                    return;
                }
            },
        };
        if let Err(e) = file.write_all(bytes).and_then(|()| file.flush()) {
            tracing::error!(error = %e, path = %path.display(), "MultiFileReporter: write failed");
        }
    }
}

impl Reporter for MultiFileReporter {
    fn open(&mut self) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::error!(error = %e, dir = %self.dir.display(), "MultiFileReporter: failed to create directory");
        }
    }

    fn close(&mut self) {
        self.files.clear();
    }

    fn handle_message(&mut self, unit: &WorkUnit, elements: &[MessageElement]) {
        let text: Vec<String> = elements.iter().map(MessageElement::render).collect();
        let mut line = text.join(" ");
        line.push('\n');
        self.handle(Some(unit), "", line.as_bytes());
    }

    fn handle_output(&mut self, unit: &WorkUnit, label: &str, bytes: &[u8]) {
        self.handle(Some(unit), label, bytes);
    }

    fn overwrite_output(&mut self, label: &str, bytes: &[u8]) {
        if !self.dir.exists() {
            return;
        }
        let path = self.dir.join(label);
        self.files.remove(&path);
        if let Err(e) = fs::write(&path, bytes) {
            tracing::error!(error = %e, path = %path.display(), "MultiFileReporter: overwrite failed");
        }
    }
}
