//! Cache service trait and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::Link;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Cache operation error: {0}")]
    OperationError(String),

    #[error("Cache serialization error: {0}")]
    SerializationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Short code to [`Link`] cache fronting the link store.
///
/// Only links that were active when written are ever put here. Implementations
/// must be thread-safe and should degrade to misses rather than fail requests.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process moka cache with per-entry TTL
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Stores a link under its code.
    ///
    /// `ttl_seconds = None` means the implementation's own default.
    ///
    /// # Errors
    ///
    /// Production implementations log and swallow backend errors.
    async fn put(&self, code: &str, link: &Link, ttl_seconds: Option<u64>) -> CacheResult<()>;

    /// Returns the cached link for a code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(link))` on cache hit
    /// - `Ok(None)` on cache miss or backend error (fail-open behavior)
    async fn get(&self, code: &str) -> CacheResult<Option<Link>>;

    /// Returns true if a live entry exists for the code.
    async fn has(&self, code: &str) -> CacheResult<bool>;

    /// Removes the entry for a code, if any.
    async fn forget(&self, code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Short backend name used in logs and health output.
    fn backend(&self) -> &'static str;
}
