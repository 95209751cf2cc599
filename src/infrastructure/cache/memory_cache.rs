//! In-process cache backed by moka.

use super::service::{CacheResult, CacheService};
use crate::domain::entities::Link;
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// A cached link together with the TTL it was stored with.
#[derive(Debug, Clone)]
struct Entry {
    link: Link,
    ttl: Duration,
}

/// Expires each entry after its own TTL.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-memory cache with per-entry TTL.
///
/// Used when no Redis is configured. Entries are evicted by TTL or, once
/// `max_capacity` is reached, by moka's TinyLFU policy.
#[derive(Clone)]
pub struct MemoryCache {
    cache: Cache<String, Entry>,
    default_ttl: Duration,
}

impl MemoryCache {
    /// Creates a cache holding at most `max_capacity` links.
    ///
    /// `default_ttl_seconds` applies when [`CacheService::put`] gets no TTL.
    pub fn new(max_capacity: u64, default_ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        }
    }

    /// Number of live entries (approximate until pending tasks run).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn put(&self, code: &str, link: &Link, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let ttl = ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_ttl)
            .max(Duration::from_secs(1));

        self.cache
            .insert(
                code.to_string(),
                Entry {
                    link: link.clone(),
                    ttl,
                },
            )
            .await;

        debug!(code, ttl_secs = ttl.as_secs(), "Cache SET");
        Ok(())
    }

    async fn get(&self, code: &str) -> CacheResult<Option<Link>> {
        match self.cache.get(code).await {
            Some(entry) => {
                debug!(code, "Cache HIT");
                Ok(Some(entry.link))
            }
            None => {
                trace!(code, "Cache MISS");
                Ok(None)
            }
        }
    }

    async fn has(&self, code: &str) -> CacheResult<bool> {
        Ok(self.cache.contains_key(code))
    }

    async fn forget(&self, code: &str) -> CacheResult<()> {
        self.cache.invalidate(code).await;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
