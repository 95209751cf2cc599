//! Repository trait for short link persistence.

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::domain::errors::StoreError;
use async_trait::async_trait;

/// Durable storage for links.
///
/// Lookups by code only ever see rows that are not soft-deleted. The store owns
/// the short-code uniqueness constraint; it is the one serialization point for
/// concurrent writers of the same code.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Finds a non-deleted link by code, whether expired or not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failures.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, StoreError>;

    /// Finds a link that is neither deleted nor expired.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failures.
    async fn find_active_by_code(&self, code: &str) -> Result<Option<Link>, StoreError>;

    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateCode`] if another non-deleted link already
    /// holds the code, even when the caller checked beforehand.
    async fn create(&self, new_link: NewLink) -> Result<Link, StoreError>;

    /// Applies a partial update and returns the fresh row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LinkGone`] if the row no longer exists.
    async fn update(&self, link: &Link, patch: LinkPatch) -> Result<Link, StoreError>;

    /// Permanently removes a link (and, in storage, its visits).
    ///
    /// Returns `Ok(false)` if the row was already gone.
    async fn delete(&self, link: &Link) -> Result<bool, StoreError>;

    /// Returns true if a non-deleted link holds the code.
    async fn exists_by_code(&self, code: &str) -> Result<bool, StoreError>;

    /// Lists non-deleted links whose expiry has passed.
    async fn list_expired(&self) -> Result<Vec<Link>, StoreError>;

    /// Checks that the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
