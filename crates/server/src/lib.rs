//! File-region HTTP server for browsing kiln run info and build output.
//!
//! Serves four prefixes over an `info_dir` and a static asset tree —
//! `/runs/`, `/browse/`, `/content/`, `/assets/` — gated by an IP
//! allow-list. Grounded on `original_source`'s `reporting_server.py` for
//! route semantics, and on `harborgrid-justin-caddy`'s `api` module for
//! the axum router/middleware/handler shape (that repo is the one example
//! in the pack with direct `use axum` call sites; `aptos-labs-aptos-core`'s
//! `api` crate lists `axum` in its `Cargo.toml` but its actual HTTP surface
//! is built on `poem`/`poem-openapi`, so it's cited here only for its
//! `#[tokio::test(flavor = "multi_thread")]` testing convention, not for
//! router code).
//!
//! The original's accept loop polls every 100 ms specifically so it can be
//! interrupted gracefully; axum has no equivalent poll loop to adapt, so
//! [`serve`] uses `axum::serve`'s native `with_graceful_shutdown` instead —
//! the idiomatic replacement for the same requirement (a clean, prompt
//! stop signal) rather than a literal port of the polling mechanism.

mod assets;
mod browse;
mod content;
mod error;
mod middleware;
mod paths;
mod runs;
mod settings;

pub use error::{Error, Result};
pub use settings::{Settings, ALLOW_ALL};

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Assemble the reporting server's router, with the IP allow-list
/// middleware applied to every route.
#[must_use]
pub fn build_router(settings: Arc<Settings>) -> Router {
    Router::new()
        .route("/runs/", get(runs::list_runs))
        .route("/browse/", get(browse::browse_root))
        .route("/browse/*path", get(browse::browse))
        .route("/content/*path", get(content::content))
        .route("/assets/*path", get(assets::assets))
        .layer(from_fn_with_state(Arc::clone(&settings), middleware::allow_list_middleware))
        .with_state(settings)
}

/// Serve `build_router(settings)` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an I/O error if the underlying accept loop fails.
pub async fn serve(
    settings: Arc<Settings>,
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let router = build_router(settings);
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
}
