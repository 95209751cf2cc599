//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::domain::visit_event::{VisitEvent, VisitMetadata};
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Resolve the code (cache first, then store)
/// 2. Queue a visit event for the background worker
/// 3. Return 302 Found
///
/// # Visit Tracking
///
/// Visit events go to a bounded channel. If the queue is full the visit is
/// dropped; the redirect never waits on it.
///
/// # Errors
///
/// Returns 404 Not Found for unknown, deleted or malformed codes.
/// Returns 410 Gone for expired links.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let link = state.resolver.get_details(&code).await?;

    let metadata = VisitMetadata {
        ip: Some(client_ip(&headers, addr, state.behind_proxy)),
        user_agent: header_value(&headers, header::USER_AGENT.as_str()),
        referer: header_value(&headers, header::REFERER.as_str()),
        country: header_value(&headers, "cf-ipcountry"),
        city: header_value(&headers, "cf-ipcity"),
    };

    match state
        .visit_sender
        .try_send(VisitEvent::new(link.id, code, metadata))
    {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!(code = %event.short_code, "Visit queue full, dropping visit");
        }
        Err(TrySendError::Closed(event)) => {
            warn!(code = %event.short_code, "Visit queue closed, dropping visit");
        }
    }

    Ok((StatusCode::FOUND, [(header::LOCATION, link.original_url)]))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Client IP: the first forwarded hop when behind a proxy, else the peer.
fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = header_value(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
            .filter(|ip| !ip.is_empty());

        if let Some(ip) = forwarded.or_else(|| header_value(headers, "x-real-ip")) {
            return ip;
        }
    }

    peer.ip().to_string()
}
