//! Link entity representing a short code to destination mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened URL.
///
/// Deletion and expiration are independent predicates: a link past its
/// `expires_at` that has not been removed yet is expired but not deleted, and a
/// soft-deleted link keeps whatever expiry it had.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Link {
    /// Creates a new Link instance.
    pub fn new(
        id: i64,
        original_url: String,
        short_code: String,
        expires_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            original_url,
            short_code,
            expires_at,
            created_at,
            updated_at: created_at,
            deleted_at,
        }
    }

    /// Returns true if the link has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    /// Returns true if the link is neither deleted nor expired.
    pub fn is_active(&self) -> bool {
        !self.is_deleted() && !self.is_expired()
    }

    /// Whole seconds left before expiry, or `None` for links that never expire.
    ///
    /// Zero once the expiry has passed.
    pub fn seconds_until_expiry(&self, now: DateTime<Utc>) -> Option<u64> {
        self.expires_at
            .map(|e| (e - now).num_seconds().max(0) as u64)
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub original_url: String,
    pub short_code: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged. For the nullable columns, `Some(None)`
/// clears the value and `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPatch {
    pub original_url: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub deleted_at: Option<Option<DateTime<Utc>>>,
}

impl LinkPatch {
    /// A patch that marks the link as soft-deleted at `at`.
    pub fn soft_delete(at: DateTime<Utc>) -> Self {
        Self {
            deleted_at: Some(Some(at)),
            ..Self::default()
        }
    }

    /// Applies the patch to an in-memory copy of a link.
    pub fn apply_to(&self, link: &mut Link, now: DateTime<Utc>) {
        if let Some(url) = &self.original_url {
            link.original_url = url.clone();
        }
        if let Some(expires_at) = self.expires_at {
            link.expires_at = expires_at;
        }
        if let Some(deleted_at) = self.deleted_at {
            link.deleted_at = deleted_at;
        }
        link.updated_at = now;
    }
}
