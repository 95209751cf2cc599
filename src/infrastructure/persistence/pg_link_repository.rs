//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use super::map_sqlx_error;
use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::domain::errors::StoreError;
use crate::domain::repositories::LinkRepository;

const LINK_COLUMNS: &str =
    "id, original_url, short_code, expires_at, created_at, updated_at, deleted_at";

#[derive(Debug, FromRow)]
struct LinkRow {
    id: i64,
    original_url: String,
    short_code: String,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link {
            id: row.id,
            original_url: row.original_url,
            short_code: row.short_code,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// PostgreSQL repository for link storage and retrieval.
///
/// Uniqueness of `short_code` among non-deleted rows is enforced by the
/// `links_short_code_key` partial unique index; violations surface as
/// [`StoreError::DuplicateCode`].
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, StoreError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE short_code = $1 AND deleted_at IS NULL"
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, code))?;

        Ok(row.map(Link::from))
    }

    async fn find_active_by_code(&self, code: &str) -> Result<Option<Link>, StoreError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE short_code = $1
              AND deleted_at IS NULL
              AND (expires_at IS NULL OR expires_at > NOW())
            "#
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, code))?;

        Ok(row.map(Link::from))
    }

    async fn create(&self, new_link: NewLink) -> Result<Link, StoreError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            INSERT INTO links (original_url, short_code, expires_at)
            VALUES ($1, $2, $3)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(&new_link.original_url)
        .bind(&new_link.short_code)
        .bind(new_link.expires_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, &new_link.short_code))?;

        Ok(row.into())
    }

    async fn update(&self, link: &Link, patch: LinkPatch) -> Result<Link, StoreError> {
        // A `true` flag means "write the paired value", which may itself be NULL.
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            UPDATE links SET
                original_url = COALESCE($2, original_url),
                expires_at   = CASE WHEN $3 THEN $4 ELSE expires_at END,
                deleted_at   = CASE WHEN $5 THEN $6 ELSE deleted_at END,
                updated_at   = NOW()
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(link.id)
        .bind(patch.original_url)
        .bind(patch.expires_at.is_some())
        .bind(patch.expires_at.flatten())
        .bind(patch.deleted_at.is_some())
        .bind(patch.deleted_at.flatten())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, &link.short_code))?;

        row.map(Link::from).ok_or(StoreError::LinkGone(link.id))
    }

    async fn delete(&self, link: &Link) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(link.id)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| map_sqlx_error(e, &link.short_code))?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_code(&self, code: &str) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM links WHERE short_code = $1 AND deleted_at IS NULL)",
        )
        .bind(code)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, code))
    }

    async fn list_expired(&self) -> Result<Vec<Link>, StoreError> {
        let rows = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE expires_at IS NOT NULL
              AND expires_at <= NOW()
              AND deleted_at IS NULL
            ORDER BY expires_at
            "#
        ))
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, ""))?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error(e, ""))
    }
}
