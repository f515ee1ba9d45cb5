//! `GET /browse/<path>` — directory listing or file-view page.

use crate::error::{Error, Result};
use crate::paths::resolve_within;
use crate::settings::Settings;
use axum::extract::{Path, State};
use axum::response::Html;
use std::fs;
use std::sync::Arc;

/// One breadcrumb segment: a display name and the `/browse/`-relative path
/// it links to.
struct Breadcrumb {
    name: String,
    link_path: String,
}

fn breadcrumbs(relpath: &str) -> Vec<Breadcrumb> {
    if relpath.is_empty() {
        return Vec::new();
    }
    let parts: Vec<&str> = relpath.split('/').filter(|p| !p.is_empty()).collect();
    let mut out = Vec::with_capacity(parts.len());
    for (i, name) in parts.iter().enumerate() {
        out.push(Breadcrumb { name: (*name).to_string(), link_path: parts[..=i].join("/") });
    }
    out
}

fn render_breadcrumbs(crumbs: &[Breadcrumb]) -> String {
    let mut out = String::from(r#"<a href="/browse/">root</a>"#);
    for crumb in crumbs {
        out.push_str(&format!(r#" / <a href="/browse/{}">{}</a>"#, html_escape(&crumb.link_path), html_escape(&crumb.name)));
    }
    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn render_dir(relpath: &str, entries: &[String]) -> String {
    let mut out = String::from("<html><body>");
    out.push_str(&format!("<div>{}</div><ul>", render_breadcrumbs(&breadcrumbs(relpath))));
    for entry in entries {
        let link = if relpath.is_empty() { entry.clone() } else { format!("{relpath}/{entry}") };
        out.push_str(&format!(r#"<li><a href="/browse/{}">{}</a></li>"#, html_escape(&link), html_escape(entry)));
    }
    out.push_str("</ul></body></html>");
    out
}

fn render_file(relpath: &str) -> String {
    format!(
        r#"<html><body><div>{}</div><iframe src="/content/{}" style="width:100%;height:80vh"></iframe></body></html>"#,
        render_breadcrumbs(&breadcrumbs(relpath)),
        html_escape(relpath),
    )
}

/// `GET /browse/` — the root listing.
pub async fn browse_root(state: State<Arc<Settings>>) -> Result<Html<String>> {
    browse(state, Path(String::new())).await
}

/// `GET /browse/<path>` handler.
pub async fn browse(State(settings): State<Arc<Settings>>, Path(relpath): Path<String>) -> Result<Html<String>> {
    let abspath = resolve_within(&settings.root, &relpath)?;

    if abspath.is_dir() {
        let mut names: Vec<String> = fs::read_dir(&abspath)
            .map_err(|e| Error::io(e, &abspath, "read_dir"))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(Html(render_dir(&relpath, &names)))
    } else if abspath.is_file() {
        Ok(Html(render_file(&relpath)))
    } else {
        Err(Error::NotFound { path: relpath })
    }
}
