//! Rate limiting middleware using token bucket algorithm.

use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use std::sync::Arc;
use tower_governor::{
    GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor},
};

/// Sustained requests per second per client.
const PER_SECOND: u64 = 2;
/// Requests a client may send in a burst.
const BURST_SIZE: u32 = 100;

/// Rate limiter keyed by the socket peer address.
///
/// # Limits
///
/// - **Rate**: 2 requests per second
/// - **Burst**: 100 requests
///
/// Requests exceeding the limit receive `429 Too Many Requests`.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/links", post(create_link_handler))
///     .layer(rate_limit::peer_layer());
/// ```
pub fn peer_layer()
-> GovernorLayer<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(PER_SECOND)
            .burst_size(BURST_SIZE)
            .finish()
            .expect("rate limit constants are non-zero"),
    );

    GovernorLayer::new(governor_conf)
}

/// Rate limiter keyed by `X-Forwarded-For` / `X-Real-IP`, falling back to
/// the peer address.
///
/// Same limits as [`peer_layer`]. Only use behind a trusted reverse proxy:
/// the headers are client-controlled otherwise.
pub fn forwarded_layer()
-> GovernorLayer<SmartIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(PER_SECOND)
            .burst_size(BURST_SIZE)
            .finish()
            .expect("rate limit constants are non-zero"),
    );

    GovernorLayer::new(governor_conf)
}
