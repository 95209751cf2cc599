//! Link and visit store implementations.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] / [`PgVisitRepository`] - PostgreSQL via SQLx
//! - [`MemoryLinkRepository`] / [`MemoryVisitRepository`] - in-process DashMap
//!   stores for `STORAGE_BACKEND=memory` and tests

pub mod memory_link_repository;
pub mod memory_visit_repository;
pub mod pg_link_repository;
pub mod pg_visit_repository;

pub use memory_link_repository::MemoryLinkRepository;
pub use memory_visit_repository::MemoryVisitRepository;
pub use pg_link_repository::PgLinkRepository;
pub use pg_visit_repository::PgVisitRepository;

use crate::domain::errors::StoreError;

/// Partial unique index guarding `links.short_code` among live rows.
const SHORT_CODE_CONSTRAINT: &str = "links_short_code_key";

/// Foreign key from `link_visits.link_id` to `links.id`.
const VISIT_LINK_CONSTRAINT: &str = "link_visits_link_id_fkey";

/// Maps a SQLx error onto the store's error vocabulary.
///
/// `subject` is the short code involved, used for duplicate reporting.
/// Foreign-key violations on visits carry the link id via [`map_visit_error`].
pub(crate) fn map_sqlx_error(e: sqlx::Error, subject: &str) -> StoreError {
    if let Some(db_err) = e.as_database_error()
        && db_err.is_unique_violation()
        && db_err.constraint() == Some(SHORT_CODE_CONSTRAINT)
    {
        return StoreError::DuplicateCode(subject.to_string());
    }

    StoreError::Database(e.to_string())
}

/// Like [`map_sqlx_error`], but reports a missing parent link as [`StoreError::LinkGone`].
pub(crate) fn map_visit_error(e: sqlx::Error, link_id: i64) -> StoreError {
    if let Some(db_err) = e.as_database_error()
        && db_err.is_foreign_key_violation()
        && db_err.constraint().is_none_or(|c| c == VISIT_LINK_CONSTRAINT)
    {
        return StoreError::LinkGone(link_id);
    }

    StoreError::Database(e.to_string())
}
