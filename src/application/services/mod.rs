//! Business logic services for the application layer.

pub mod expiry_sweep;
pub mod resolver_service;
pub mod shortener_service;
pub mod statistics_service;
pub mod visit_recorder;

pub use expiry_sweep::{ExpirySweepService, SweepReport};
pub use resolver_service::ResolverService;
pub use shortener_service::ShortenerService;
pub use statistics_service::{LinkStatistics, StatisticsService, VisitSummary};
pub use visit_recorder::VisitRecorder;

use chrono::{DateTime, Utc};

use crate::domain::entities::Link;
use crate::infrastructure::cache::CacheService;

/// Cache TTL when none is configured: one day.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 86_400;

/// TTL for caching `link`: its remaining lifetime (at least one second) when it
/// expires, otherwise `default_ttl`.
pub(crate) fn cache_ttl_for(link: &Link, default_ttl: u64, now: DateTime<Utc>) -> u64 {
    link.seconds_until_expiry(now)
        .map(|secs| secs.max(1))
        .unwrap_or(default_ttl)
}

/// Writes `link` to the cache. Failures are logged, never returned.
pub(crate) async fn cache_link<C: CacheService + ?Sized>(cache: &C, link: &Link, default_ttl: u64) {
    let ttl = cache_ttl_for(link, default_ttl, Utc::now());

    if let Err(e) = cache.put(&link.short_code, link, Some(ttl)).await {
        tracing::warn!(code = %link.short_code, error = %e, "Failed to cache link");
    }
}
