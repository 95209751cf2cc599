//! Link creation and removal.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use super::cache_link;
use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::domain::errors::{LinkError, StoreError};
use crate::domain::repositories::LinkRepository;
use crate::domain::value_objects::{ShortCode, Url};
use crate::infrastructure::cache::CacheService;

/// Attempts at drawing an unused random code before giving up.
pub const MAX_GENERATION_ATTEMPTS: usize = 10;

/// Creates short links and soft-deletes them.
///
/// The store's unique index on live short codes is what keeps codes unique
/// under concurrent writers. The existence checks done here only avoid
/// pointless inserts; a constraint violation on insert still surfaces as
/// [`LinkError::DuplicateCode`].
pub struct ShortenerService<L: LinkRepository + ?Sized, C: CacheService + ?Sized> {
    link_repository: Arc<L>,
    cache: Arc<C>,
    cache_ttl_seconds: u64,
}

impl<L: LinkRepository + ?Sized, C: CacheService + ?Sized> ShortenerService<L, C> {
    /// Creates a new shortener.
    ///
    /// `cache_ttl_seconds` is used for links without an expiry.
    pub fn new(link_repository: Arc<L>, cache: Arc<C>, cache_ttl_seconds: u64) -> Self {
        Self {
            link_repository,
            cache,
            cache_ttl_seconds,
        }
    }

    /// Shortens `original_url`.
    ///
    /// # Arguments
    ///
    /// - `original_url` - absolute http(s) URL, at most 2048 characters
    /// - `ttl_minutes` - lifetime of the link; `None` or `Some(0)` never expires
    /// - `custom_code` - caller-chosen code, 6-10 alphanumerics
    ///
    /// # Errors
    ///
    /// - [`LinkError::InvalidUrl`] / [`LinkError::InvalidShortCode`] on bad input
    /// - [`LinkError::DuplicateCode`] if `custom_code` is taken by a live link
    /// - [`LinkError::GenerationExhausted`] if every random code collided
    /// - [`LinkError::Storage`] on store failure
    pub async fn shorten(
        &self,
        original_url: &str,
        ttl_minutes: Option<u32>,
        custom_code: Option<&str>,
    ) -> Result<Link, LinkError> {
        let url = Url::new(original_url)?;
        let expires_at = ttl_minutes
            .filter(|minutes| *minutes > 0)
            .map(|minutes| Utc::now() + Duration::minutes(i64::from(minutes)));

        let link = match custom_code {
            Some(custom) => {
                let code = ShortCode::new(custom)?;
                self.ensure_available(&code).await?;
                self.link_repository
                    .create(NewLink {
                        original_url: url.into_inner(),
                        short_code: code.into_inner(),
                        expires_at,
                    })
                    .await?
            }
            None => self.create_with_generated_code(url, expires_at).await?,
        };

        cache_link(self.cache.as_ref(), &link, self.cache_ttl_seconds).await;

        info!(
            code = %link.short_code,
            link_id = link.id,
            expires_at = ?link.expires_at,
            "Link created"
        );

        Ok(link)
    }

    /// Soft-deletes the live link behind `code` and drops it from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] if no live link has this code.
    pub async fn delete(&self, code: &str) -> Result<Link, LinkError> {
        let link = self
            .link_repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| LinkError::NotFound(code.to_string()))?;

        let deleted = self
            .link_repository
            .update(&link, LinkPatch::soft_delete(Utc::now()))
            .await
            .map_err(|e| match e {
                // Swept between the lookup and the update.
                StoreError::LinkGone(_) => LinkError::NotFound(code.to_string()),
                other => other.into(),
            })?;

        if let Err(e) = self.cache.forget(code).await {
            warn!(code, error = %e, "Failed to evict deleted link from cache");
        }

        info!(code, link_id = deleted.id, "Link deleted");
        Ok(deleted)
    }

    async fn ensure_available(&self, code: &ShortCode) -> Result<(), LinkError> {
        let cached = self.cache.has(code.as_str()).await.unwrap_or(false);

        if cached || self.link_repository.exists_by_code(code.as_str()).await? {
            return Err(LinkError::DuplicateCode(code.to_string()));
        }

        Ok(())
    }

    /// Draws random codes until one is both unused and inserted.
    ///
    /// An insert that loses a race on the unique index counts as a collision.
    async fn create_with_generated_code(
        &self,
        url: Url,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<Link, LinkError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = ShortCode::generate()?;

            if self.link_repository.exists_by_code(code.as_str()).await? {
                debug!(attempt, code = %code, "Generated code collided");
                continue;
            }

            let new_link = NewLink {
                original_url: url.as_str().to_string(),
                short_code: code.into_inner(),
                expires_at,
            };

            match self.link_repository.create(new_link).await {
                Ok(link) => return Ok(link),
                Err(StoreError::DuplicateCode(code)) => {
                    debug!(attempt, code = %code, "Generated code taken concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            attempts = MAX_GENERATION_ATTEMPTS,
            "Short code space exhausted for this request"
        );
        Err(LinkError::GenerationExhausted(MAX_GENERATION_ATTEMPTS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockLinkRepository;
    use crate::domain::value_objects::UrlError;
    use crate::infrastructure::cache::MockCacheService;

    fn stored(new_link: NewLink) -> Link {
        Link::new(
            10,
            new_link.original_url,
            new_link.short_code,
            new_link.expires_at,
            Utc::now(),
            None,
        )
    }

    fn quiet_cache() -> MockCacheService {
        let mut cache = MockCacheService::new();
        cache.expect_has().returning(|_| Ok(false));
        cache.expect_put().returning(|_, _, _| Ok(()));
        cache
    }

    fn service(repo: MockLinkRepository, cache: MockCacheService) -> ShortenerService<MockLinkRepository, MockCacheService> {
        ShortenerService::new(Arc::new(repo), Arc::new(cache), 86_400)
    }

    #[tokio::test]
    async fn test_shorten_with_generated_code() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists_by_code().times(1).returning(|_| Ok(false));
        repo.expect_create()
            .withf(|l| l.original_url == "https://example.com/page" && l.expires_at.is_none())
            .times(1)
            .returning(|l| Ok(stored(l)));

        let link = service(repo, quiet_cache())
            .shorten("https://example.com/page", None, None)
            .await
            .unwrap();

        assert_eq!(link.short_code.len(), 7);
        assert!(ShortCode::new(&link.short_code).is_ok());
    }

    #[tokio::test]
    async fn test_shorten_caches_with_default_ttl() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists_by_code().returning(|_| Ok(false));
        repo.expect_create().returning(|l| Ok(stored(l)));

        let mut cache = MockCacheService::new();
        cache
            .expect_put()
            .withf(|_, _, ttl| *ttl == Some(86_400))
            .times(1)
            .returning(|_, _, _| Ok(()));

        service(repo, cache)
            .shorten("https://example.com", None, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_shorten_with_ttl_sets_expiry_and_cache_ttl() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists_by_code().returning(|_| Ok(false));
        repo.expect_create().returning(|l| Ok(stored(l)));

        let mut cache = MockCacheService::new();
        cache
            .expect_put()
            .withf(|_, _, ttl| matches!(ttl, Some(t) if (3595..=3600).contains(t)))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let before = Utc::now();
        let link = service(repo, cache)
            .shorten("https://example.com", Some(60), None)
            .await
            .unwrap();

        let expires_at = link.expires_at.unwrap();
        let delta = expires_at - before;
        assert!(delta >= Duration::minutes(60));
        assert!(delta < Duration::minutes(60) + Duration::seconds(5));
    }

    #[tokio::test]
    async fn test_zero_ttl_means_no_expiry() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists_by_code().returning(|_| Ok(false));
        repo.expect_create()
            .withf(|l| l.expires_at.is_none())
            .returning(|l| Ok(stored(l)));

        let link = service(repo, quiet_cache())
            .shorten("https://example.com", Some(0), None)
            .await
            .unwrap();
        assert!(link.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_touches_nothing() {
        let repo = MockLinkRepository::new();
        let cache = MockCacheService::new();

        let err = service(repo, cache)
            .shorten("ftp://example.com/file", None, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LinkError::InvalidUrl(UrlError::UnsupportedScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_custom_code() {
        let repo = MockLinkRepository::new();
        let cache = MockCacheService::new();

        let err = service(repo, cache)
            .shorten("https://example.com", None, Some("ab-12"))
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::InvalidShortCode(_)));
    }

    #[tokio::test]
    async fn test_custom_code_taken_in_store() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists_by_code()
            .withf(|code| code == "mycode1")
            .times(1)
            .returning(|_| Ok(true));
        repo.expect_create().never();

        let err = service(repo, quiet_cache())
            .shorten("https://example.com", None, Some("mycode1"))
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::DuplicateCode(code) if code == "mycode1"));
    }

    #[tokio::test]
    async fn test_custom_code_taken_in_cache_skips_store() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists_by_code().never();
        repo.expect_create().never();

        let mut cache = MockCacheService::new();
        cache.expect_has().times(1).returning(|_| Ok(true));

        let err = service(repo, cache)
            .shorten("https://example.com", None, Some("cached1"))
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::DuplicateCode(_)));
    }

    #[tokio::test]
    async fn test_unique_violation_on_insert_is_duplicate_code() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists_by_code().returning(|_| Ok(false));
        repo.expect_create()
            .times(1)
            .returning(|l| Err(StoreError::DuplicateCode(l.short_code)));

        let err = service(repo, quiet_cache())
            .shorten("https://example.com", None, Some("racer01"))
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::DuplicateCode(code) if code == "racer01"));
    }

    #[tokio::test]
    async fn test_generation_exhausted_after_ten_collisions() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists_by_code()
            .times(MAX_GENERATION_ATTEMPTS)
            .returning(|_| Ok(true));
        repo.expect_create().never();

        let err = service(repo, quiet_cache())
            .shorten("https://example.com", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::GenerationExhausted(10)));
    }

    #[tokio::test]
    async fn test_generation_retries_after_lost_insert_race() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists_by_code().times(2).returning(|_| Ok(false));

        let mut seq = mockall::Sequence::new();
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|l| Err(StoreError::DuplicateCode(l.short_code)));
        repo.expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|l| Ok(stored(l)));

        let link = service(repo, quiet_cache())
            .shorten("https://example.com", None, None)
            .await
            .unwrap();
        assert_eq!(link.id, 10);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let mut repo = MockLinkRepository::new();
        repo.expect_exists_by_code()
            .returning(|_| Err(StoreError::Database("connection refused".to_string())));

        let err = service(repo, quiet_cache())
            .shorten("https://example.com", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::Storage(_)));
    }

    #[tokio::test]
    async fn test_delete_soft_deletes_and_forgets() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|code| {
            Ok(Some(Link::new(
                3,
                "https://example.com".to_string(),
                code.to_string(),
                None,
                Utc::now(),
                None,
            )))
        });
        repo.expect_update()
            .withf(|_, patch| matches!(patch.deleted_at, Some(Some(_))) && patch.original_url.is_none())
            .times(1)
            .returning(|link, patch| {
                let mut link = link.clone();
                patch.apply_to(&mut link, Utc::now());
                Ok(link)
            });

        let mut cache = MockCacheService::new();
        cache
            .expect_forget()
            .withf(|code| code == "bye1234")
            .times(1)
            .returning(|_| Ok(()));

        let deleted = service(repo, cache).delete("bye1234").await.unwrap();
        assert!(deleted.is_deleted());
    }

    #[tokio::test]
    async fn test_delete_racing_sweep_reports_code() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|code| {
            Ok(Some(Link::new(
                17,
                "https://example.com".to_string(),
                code.to_string(),
                None,
                Utc::now(),
                None,
            )))
        });
        repo.expect_update()
            .returning(|link, _| Err(StoreError::LinkGone(link.id)));

        let mut cache = MockCacheService::new();
        cache.expect_forget().never();

        let err = service(repo, cache).delete("race123").await.unwrap_err();
        assert_eq!(err, LinkError::NotFound("race123".to_string()));
    }

    #[tokio::test]
    async fn test_delete_unknown_code() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));
        repo.expect_update().never();

        let err = service(repo, MockCacheService::new())
            .delete("nothing")
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::NotFound(_)));
    }
}
