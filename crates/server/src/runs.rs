//! `GET /runs/` — index every persisted run, grouped by calendar day.
//!
//! Ported from `reporting_server.py`'s `_partition_runs_by_day`/`date_text`:
//! group by the run's local calendar date, label each group Today/
//! Yesterday/weekday-name/"Month Day'th'", and list the newest group first.

use crate::error::Result;
use crate::settings::Settings;
use axum::extract::State;
use axum::response::Html;
use chrono::{Local, NaiveDate, TimeZone};
use kiln_report::RunInfo;
use std::fs;
use std::sync::Arc;

/// One run, as shown in the `/runs/` index.
#[derive(Debug, Clone)]
pub struct RunEntry {
    /// The run id, e.g. `pants_run_2026_07_28_12_00_00_000`.
    pub id: String,
    /// `cmd_line` value from the run-info file, if present.
    pub cmd_line: Option<String>,
    /// `outcome` value from the run-info file, if present.
    pub outcome: Option<String>,
    /// `HH:MM:SS.mmm`, local time.
    pub time_of_day_text: String,
    local_date: NaiveDate,
}

/// One calendar-day group in the `/runs/` index.
#[derive(Debug, Clone)]
pub struct DayBucket {
    /// Human label: "Today", "Yesterday", a weekday name, or "Month Day'th'".
    pub date_text: String,
    /// Runs on this day, newest first.
    pub runs: Vec<RunEntry>,
}

/// Read every `*.info` file under `info_dir` into a [`RunEntry`].
///
/// Missing or unreadable `info_dir` yields an empty list, matching the
/// original's `if not os.path.isdir(...): return []` guard — a fresh
/// install or a `clean-all`'d info dir isn't a server error.
fn read_run_entries(settings: &Settings) -> Vec<RunEntry> {
    let Ok(read_dir) = fs::read_dir(&settings.info_dir) else { return Vec::new() };

    let mut entries = Vec::new();
    for dir_entry in read_dir.flatten() {
        let path = dir_entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("info") {
            continue;
        }
        let Ok(info) = RunInfo::load(path) else { continue };
        let Some(id) = info.get("id").map(str::to_string) else { continue };
        let Some(timestamp) = info.get("timestamp").and_then(|t| t.parse::<i64>().ok()) else { continue };
        let Some(local) = Local.timestamp_opt(timestamp, 0).single() else { continue };

        entries.push(RunEntry {
            id,
            cmd_line: info.get("cmd_line").map(str::to_string),
            outcome: info.get("outcome").map(str::to_string),
            time_of_day_text: local.format("%H:%M:%S.000").to_string(),
            local_date: local.date_naive(),
        });
    }
    entries
}

/// Today/Yesterday/weekday-name/"Month Day'th'" for `date`, relative to
/// `today`. An explicit `today` parameter keeps this pure and testable
/// rather than calling `Local::now()` internally.
#[must_use]
pub fn date_text(date: NaiveDate, today: NaiveDate) -> String {
    let delta_days = (today - date).num_days();
    if delta_days == 0 {
        "Today".to_string()
    } else if delta_days == 1 {
        "Yesterday".to_string()
    } else if delta_days < 7 {
        date.format("%A").to_string()
    } else {
        let suffix = match date.format("%d").to_string().parse::<u32>().unwrap_or(0) % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        };
        format!("{}{}", date.format("%B %d"), suffix)
    }
}

/// Group `entries` by local calendar day, newest day first, newest run
/// first within each day.
#[must_use]
pub fn partition_runs_by_day(mut entries: Vec<RunEntry>, today: NaiveDate) -> Vec<DayBucket> {
    entries.sort_by(|a, b| b.id.cmp(&a.id));

    let mut buckets: Vec<DayBucket> = Vec::new();
    for entry in entries {
        match buckets.last_mut().filter(|b| b.runs.last().is_some_and(|r| r.local_date == entry.local_date)) {
            Some(bucket) => bucket.runs.push(entry),
            None => buckets.push(DayBucket { date_text: date_text(entry.local_date, today), runs: vec![entry] }),
        }
    }
    buckets
}

fn render(buckets: &[DayBucket]) -> String {
    let mut out = String::from("<html><body><h1>Runs</h1>");
    for bucket in buckets {
        out.push_str(&format!("<h2>{}</h2><ul>", html_escape(&bucket.date_text)));
        for run in &bucket.runs {
            out.push_str(&format!(
                "<li>{} {} — {}{}</li>",
                html_escape(&run.time_of_day_text),
                html_escape(&run.id),
                html_escape(run.cmd_line.as_deref().unwrap_or("")),
                run.outcome.as_deref().map(|o| format!(" [{}]", html_escape(o))).unwrap_or_default(),
            ));
        }
        out.push_str("</ul>");
    }
    out.push_str("</body></html>");
    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// `GET /runs/` handler.
pub async fn list_runs(State(settings): State<Arc<Settings>>) -> Result<Html<String>> {
    let entries = read_run_entries(&settings);
    let today = Local::now().date_naive();
    let buckets = partition_runs_by_day(entries, today);
    Ok(Html(render(&buckets)))
}
