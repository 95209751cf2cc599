//! Short code resolution.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::cache_link;
use crate::domain::entities::Link;
use crate::domain::errors::LinkError;
use crate::domain::repositories::LinkRepository;
use crate::domain::value_objects::ShortCode;
use crate::infrastructure::cache::CacheService;

/// Resolves short codes, cache first.
///
/// Lookup order:
///
/// 1. Cache. A hit is re-checked against its own `expires_at`; an entry that
///    outlived its link is evicted and reported as expired.
/// 2. Active links in the store. A hit is written back to the cache.
/// 3. Any live link in the store, to tell an expired code from an unknown one.
pub struct ResolverService<L: LinkRepository + ?Sized, C: CacheService + ?Sized> {
    link_repository: Arc<L>,
    cache: Arc<C>,
    cache_ttl_seconds: u64,
}

impl<L: LinkRepository + ?Sized, C: CacheService + ?Sized> ResolverService<L, C> {
    pub fn new(link_repository: Arc<L>, cache: Arc<C>, cache_ttl_seconds: u64) -> Self {
        Self {
            link_repository,
            cache,
            cache_ttl_seconds,
        }
    }

    /// Returns the original URL behind `code`.
    ///
    /// # Errors
    ///
    /// [`LinkError::NotFound`], [`LinkError::Expired`] or [`LinkError::Storage`].
    pub async fn resolve(&self, code: &str) -> Result<String, LinkError> {
        self.get_details(code).await.map(|link| link.original_url)
    }

    /// Returns the active link behind `code`.
    ///
    /// Codes that are not well-formed cannot exist and resolve as
    /// [`LinkError::NotFound`] without touching cache or store.
    pub async fn get_details(&self, code: &str) -> Result<Link, LinkError> {
        if ShortCode::new(code).is_err() {
            return Err(LinkError::NotFound(code.to_string()));
        }

        if let Some(link) = self.cached(code).await {
            if link.is_expired_at(Utc::now()) {
                self.evict(code).await;
                return Err(LinkError::Expired(code.to_string()));
            }
            return Ok(link);
        }

        if let Some(link) = self.link_repository.find_active_by_code(code).await? {
            cache_link(self.cache.as_ref(), &link, self.cache_ttl_seconds).await;
            return Ok(link);
        }

        match self.link_repository.find_by_code(code).await? {
            Some(link) if link.is_expired() => Err(LinkError::Expired(code.to_string())),
            // Became active between the two queries (e.g. restored).
            Some(link) => {
                cache_link(self.cache.as_ref(), &link, self.cache_ttl_seconds).await;
                Ok(link)
            }
            None => Err(LinkError::NotFound(code.to_string())),
        }
    }

    async fn cached(&self, code: &str) -> Option<Link> {
        match self.cache.get(code).await {
            Ok(Some(link)) => {
                debug!(code, "Resolved from cache");
                Some(link)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(code, error = %e, "Cache lookup failed, falling back to store");
                None
            }
        }
    }

    async fn evict(&self, code: &str) {
        if let Err(e) = self.cache.forget(code).await {
            warn!(code, error = %e, "Failed to evict expired link from cache");
        }
    }
}
