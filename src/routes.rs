//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`      - Short link redirect
//! - `GET  /health`      - Health check: store, cache, visit queue
//! - `/api/*`            - Link management API
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on `/api`
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{rate_limit, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Routes and tracing, without rate limiting.
///
/// Used by [`app_router`] and by tests that should not trip the limiter.
pub fn router(state: AppState) -> Router {
    routes(api::routes::api_routes(), state)
}

/// Constructs the production router.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let api_router = if behind_proxy {
        api::routes::api_routes().layer(rate_limit::forwarded_layer())
    } else {
        api::routes::api_routes().layer(rate_limit::peer_layer())
    };

    NormalizePathLayer::trim_trailing_slash().layer(routes(api_router, state))
}

fn routes(api_router: Router<AppState>, state: AppState) -> Router {
    Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer())
}
