//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use crate::domain::entities::Link;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Redis cache storing links as JSON under `link:{code}`.
///
/// Uses `ConnectionManager` for automatic reconnection. All operations are
/// fail-open: errors are logged but don't propagate to callers.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures the default TTL.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl_seconds` - TTL applied when [`CacheService::put`] is called
    ///   with `ttl_seconds = None`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "link:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, code: &str) -> String {
        format!("{}{}", self.key_prefix, code)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn put(&self, code: &str, link: &Link, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let key = self.build_key(code);
        let mut conn = self.client.clone();
        let ttl = ttl_seconds.unwrap_or(self.default_ttl).max(1);

        let payload = match serde_json::to_string(link) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(code, error = %e, "Failed to serialize link for cache");
                return Ok(());
            }
        };

        match conn.set_ex::<_, _, ()>(&key, payload, ttl).await {
            Ok(_) => {
                debug!(code, ttl, "Cache SET");
                Ok(())
            }
            Err(e) => {
                warn!(code, error = %e, "Redis SET error");
                Ok(())
            }
        }
    }

    async fn get(&self, code: &str) -> CacheResult<Option<Link>> {
        let key = self.build_key(code);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(payload)) => match serde_json::from_str::<Link>(&payload) {
                Ok(link) => {
                    debug!(code, "Cache HIT");
                    Ok(Some(link))
                }
                Err(e) => {
                    warn!(code, error = %e, "Discarding undecodable cache entry");
                    let _ = conn.del::<_, i32>(&key).await;
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!(code, "Cache MISS");
                Ok(None)
            }
            Err(e) => {
                error!(code, error = %e, "Redis GET error");
                Ok(None)
            }
        }
    }

    async fn has(&self, code: &str) -> CacheResult<bool> {
        let key = self.build_key(code);
        let mut conn = self.client.clone();

        match conn.exists::<_, bool>(&key).await {
            Ok(found) => Ok(found),
            Err(e) => {
                warn!(code, error = %e, "Redis EXISTS error");
                Ok(false)
            }
        }
    }

    async fn forget(&self, code: &str) -> CacheResult<()> {
        let key = self.build_key(code);
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!(code, "Cache FORGET");
                }
                Ok(())
            }
            Err(e) => {
                warn!(code, error = %e, "Redis DEL error");
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
