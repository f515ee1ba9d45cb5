//! `GET /assets/<path>` — static files served with an extension-guessed
//! MIME type, ported from `_serve_asset`.

use crate::error::{Error, Result};
use crate::paths::resolve_within;
use crate::settings::Settings;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use std::fs;
use std::sync::Arc;

/// `GET /assets/<path>` handler.
pub async fn assets(State(settings): State<Arc<Settings>>, Path(relpath): Path<String>) -> Result<Response> {
    let abspath = resolve_within(&settings.assets_dir, &relpath)?;
    if !abspath.is_file() {
        return Err(Error::NotFound { path: relpath });
    }

    let bytes = fs::read(&abspath).map_err(|e| Error::io(e, &abspath, "read"))?;
    let mime = mime_guess::from_path(&abspath).first_or_octet_stream();
    Ok((
        [(header::CONTENT_TYPE, mime.essence_str().to_string())],
        Body::from(bytes),
    )
        .into_response())
}
