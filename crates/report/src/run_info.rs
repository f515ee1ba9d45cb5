use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// An appendable key-value record persisted at `<info_dir>/<run_id>.info`.
///
/// Entries are added at construction, then later as the run progresses,
/// finishing with a single outcome entry on clean shutdown — the file is
/// written to across the run's lifetime, not once — so this keeps an
/// in-memory ordered list of entries and rewrites the whole file
/// (atomically) on every [`Self::insert`], rather than a flat map that
/// would lose the "one line per key, in the order keys were added"
/// format.
pub struct RunInfo {
    path: PathBuf,
    entries: Vec<(String, String)>,
}

impl RunInfo {
    /// Create a new, empty run-info record at `path`. Nothing is written
    /// to disk until the first [`Self::insert`].
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path, entries: Vec::new() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert (or replace, if the key already exists) `key: value`, then
    /// atomically rewrite the backing file: write to a temp path, rename
    /// over the real one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if any filesystem operation fails.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
        self.flush()
    }

    /// Insert every `(key, value)` pair in order, then flush once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if any filesystem operation fails.
    pub fn insert_all<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in pairs {
            let k = k.into();
            let v = v.into();
            if let Some(entry) = self.entries.iter_mut().find(|(existing, _)| *existing == k) {
                entry.1 = v;
            } else {
                self.entries.push((k, v));
            }
        }
        self.flush()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Read back a record previously written by [`Self::insert`]/
    /// [`Self::insert_all`]: one `key: value` pair per line, split on the
    /// first `": "`. Lines that don't contain the separator are skipped —
    /// readers of run-info already tolerate a partially-written file (a
    /// `clean-all` goal may remove `info_dir` mid-run).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `path` can't be read.
    pub fn load(path: PathBuf) -> Result<Self> {
        let body = fs::read_to_string(&path).map_err(|e| Error::io(e, &path, "read_to_string"))?;
        let entries = body
            .lines()
            .filter_map(|line| line.split_once(": "))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create_dir_all"))?;
        }
        let tmp_path = self.path.with_extension("info.tmp");
        let mut body = String::new();
        for (key, value) in &self.entries {
            body.push_str(key);
            body.push_str(": ");
            body.push_str(value);
            body.push('\n');
        }
        let mut file = fs::File::create(&tmp_path).map_err(|e| Error::io(e, &tmp_path, "create"))?;
        file.write_all(body.as_bytes()).map_err(|e| Error::io(e, &tmp_path, "write"))?;
        file.sync_all().map_err(|e| Error::io(e, &tmp_path, "sync_all"))?;
        drop(file);
        fs::rename(&tmp_path, &self.path).map_err(|e| Error::io(e, &self.path, "rename"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn insert_writes_one_line_per_key_in_insertion_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.info");
        let mut info = RunInfo::new(path.clone());
        info.insert("id", "pants_run_1").unwrap();
        info.insert("timestamp", "123.0").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id: pants_run_1\ntimestamp: 123.0\n");
    }

    #[test]
    fn insert_replaces_existing_key_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.info");
        let mut info = RunInfo::new(path.clone());
        info.insert("id", "a").unwrap();
        info.insert("outcome", "pending").unwrap();
        info.insert("outcome", "SUCCESS").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id: a\noutcome: SUCCESS\n");
    }

    #[test]
    fn get_reads_back_inserted_value() {
        let dir = TempDir::new().unwrap();
        let mut info = RunInfo::new(dir.path().join("run.info"));
        info.insert("cmd_line", "kiln build //foo").unwrap();
        assert_eq!(info.get("cmd_line"), Some("kiln build //foo"));
        assert_eq!(info.get("missing"), None);
    }

    #[test]
    fn load_round_trips_a_written_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.info");
        let mut info = RunInfo::new(path.clone());
        info.insert("id", "pants_run_1").unwrap();
        info.insert("timestamp", "123.0").unwrap();

        let loaded = RunInfo::load(path).unwrap();
        assert_eq!(loaded.get("id"), Some("pants_run_1"));
        assert_eq!(loaded.get("timestamp"), Some("123.0"));
        assert_eq!(loaded.entries().len(), 2);
    }
}
