//! `GET /content/<path>?s=&e=` — byte-range read of a file.
//!
//! Ports `_serve_file_content`: `s` defaults to 0, `e` defaults to EOF.
//! Binary content is escaped and wrapped at 120 columns (the original's
//! `repr()`-then-120-char-chunk); text content is served as-is and left
//! for the client to syntax-highlight.

use crate::error::{Error, Result};
use crate::paths::resolve_within;
use crate::settings::Settings;
use axum::extract::{Path, Query, State};
use axum::response::Html;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;

const WRAP_COLUMNS: usize = 120;

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    s: Option<u64>,
    e: Option<u64>,
}

fn slice_range(bytes: &[u8], start: u64, end: Option<u64>) -> &[u8] {
    let start = usize::try_from(start).unwrap_or(usize::MAX).min(bytes.len());
    let end = end.map_or(bytes.len(), |e| usize::try_from(e).unwrap_or(usize::MAX).min(bytes.len()));
    if end <= start { &[] } else { &bytes[start..end] }
}

fn escape_and_wrap(bytes: &[u8]) -> String {
    let escaped: String = bytes.iter().flat_map(|b| std::ascii::escape_default(*b)).map(char::from).collect();
    escaped.as_bytes().chunks(WRAP_COLUMNS).map(|chunk| String::from_utf8_lossy(chunk).into_owned()).collect::<Vec<_>>().join("\n")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// `GET /content/<path>` handler.
pub async fn content(
    State(settings): State<Arc<Settings>>,
    Path(relpath): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<Html<String>> {
    let abspath = resolve_within(&settings.root, &relpath)?;
    if !abspath.is_file() {
        return Err(Error::NotFound { path: relpath });
    }

    let bytes = fs::read(&abspath).map_err(|e| Error::io(e, &abspath, "read"))?;
    let region = slice_range(&bytes, query.s.unwrap_or(0), query.e);

    let mime = mime_guess::from_path(&abspath).first_or_text_plain();
    let is_text = mime.type_() == mime::TEXT;

    let html = if is_text {
        format!(
            r#"<pre data-kiln-highlight="client">{}</pre>"#,
            html_escape(&String::from_utf8_lossy(region))
        )
    } else {
        format!("<pre>{}</pre>", escape_and_wrap(region))
    };
    Ok(Html(html))
}
