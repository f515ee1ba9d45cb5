//! Access-control middleware: rejects clients not on the allow-list.
//!
//! Shaped like `harborgrid-justin-caddy`'s `auth_middleware` (a
//! `State<Arc<_>>` extractor plus a fallible `Request -> Next` pass-through),
//! substituting a client-IP allow-list check for JWT verification.

use crate::error::Error;
use crate::settings::Settings;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use std::sync::Arc;

/// Reject any request whose peer address isn't on `settings.allowed_clients`.
pub async fn allow_list_middleware(
    State(settings): State<Arc<Settings>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    let client_ip = addr.ip().to_string();
    if !settings.is_allowed(&client_ip) {
        return Err(Error::ForbiddenClient { client: client_ip });
    }
    Ok(next.run(request).await)
}
