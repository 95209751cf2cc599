//! No-op cache implementation for disabled caching.

use super::service::{CacheResult, CacheService};
use crate::domain::entities::Link;
use async_trait::async_trait;
use tracing::debug;

/// A cache implementation that does nothing.
///
/// Every lookup is a miss, so the engines always fall through to the store.
///
/// # Use Cases
///
/// - `CACHE_MAX_ENTRIES=0` with no Redis configured
/// - The admin CLI when no Redis is configured
/// - Tests that must observe every store call
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn put(&self, _code: &str, _link: &Link, _ttl_seconds: Option<u64>) -> CacheResult<()> {
        Ok(())
    }

    async fn get(&self, _code: &str) -> CacheResult<Option<Link>> {
        Ok(None)
    }

    async fn has(&self, _code: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn forget(&self, _code: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "none"
    }
}
