//! In-memory implementation of link repository.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::entities::{Link, LinkPatch, NewLink, Visit};
use crate::domain::errors::StoreError;
use crate::domain::repositories::LinkRepository;

/// Link store held in process memory.
///
/// Rows live in `rows` keyed by id. `live_codes` indexes the short codes of
/// rows that are not soft-deleted; claiming a code goes through its entry
/// lock, so two concurrent creates with the same code cannot both succeed.
///
/// Visits are kept here too, in a table shared with
/// [`MemoryVisitRepository`](super::MemoryVisitRepository), so that a hard
/// delete drops them the way `ON DELETE CASCADE` does.
#[derive(Debug)]
pub struct MemoryLinkRepository {
    rows: DashMap<i64, Link>,
    live_codes: DashMap<String, i64>,
    visits: Arc<VisitTable>,
    next_id: AtomicI64,
}

/// Visits grouped by link id.
pub(super) type VisitTable = DashMap<i64, Vec<Visit>>;

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            live_codes: DashMap::new(),
            visits: Arc::new(DashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub(super) fn visit_table(&self) -> Arc<VisitTable> {
        self.visits.clone()
    }

    /// Runs `f` while holding the row for `id`, or returns `None` if it is gone.
    ///
    /// A concurrent [`delete`](LinkRepository::delete) waits for `f` to finish.
    pub(super) fn with_row<T>(&self, id: i64, f: impl FnOnce() -> T) -> Option<T> {
        let _row = self.rows.get(&id)?;
        Some(f())
    }

    /// True if a row with this id exists, deleted or not.
    pub fn contains_id(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    /// Number of stored rows, including soft-deleted ones.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn live(&self, code: &str) -> Option<Link> {
        let id = *self.live_codes.get(code)?;
        self.rows.get(&id).map(|row| row.clone())
    }
}

impl Default for MemoryLinkRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, StoreError> {
        Ok(self.live(code))
    }

    async fn find_active_by_code(&self, code: &str) -> Result<Option<Link>, StoreError> {
        Ok(self.live(code).filter(Link::is_active))
    }

    async fn create(&self, new_link: NewLink) -> Result<Link, StoreError> {
        match self.live_codes.entry(new_link.short_code.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateCode(new_link.short_code)),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let link = Link::new(
                    id,
                    new_link.original_url,
                    new_link.short_code,
                    new_link.expires_at,
                    Utc::now(),
                    None,
                );

                self.rows.insert(id, link.clone());
                slot.insert(id);
                Ok(link)
            }
        }
    }

    async fn update(&self, link: &Link, patch: LinkPatch) -> Result<Link, StoreError> {
        let mut current = self
            .rows
            .get(&link.id)
            .map(|row| row.clone())
            .ok_or(StoreError::LinkGone(link.id))?;

        let was_deleted = current.is_deleted();
        patch.apply_to(&mut current, Utc::now());

        let restored = match (was_deleted, current.is_deleted()) {
            (false, true) => {
                self.live_codes
                    .remove_if(&current.short_code, |_, id| *id == current.id);
                false
            }
            (true, false) => match self.live_codes.entry(current.short_code.clone()) {
                Entry::Occupied(_) => {
                    return Err(StoreError::DuplicateCode(current.short_code));
                }
                Entry::Vacant(slot) => {
                    slot.insert(current.id);
                    true
                }
            },
            _ => false,
        };

        // Never write back a row that was hard-deleted in the meantime.
        let Some(mut row) = self.rows.get_mut(&current.id) else {
            if restored {
                self.live_codes
                    .remove_if(&current.short_code, |_, id| *id == current.id);
            }
            return Err(StoreError::LinkGone(current.id));
        };
        *row = current.clone();

        Ok(current)
    }

    async fn delete(&self, link: &Link) -> Result<bool, StoreError> {
        let Some((_, removed)) = self.rows.remove(&link.id) else {
            return Ok(false);
        };

        self.live_codes
            .remove_if(&removed.short_code, |_, id| *id == removed.id);
        self.visits.remove(&removed.id);
        Ok(true)
    }

    async fn exists_by_code(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.live_codes.contains_key(code))
    }

    async fn list_expired(&self) -> Result<Vec<Link>, StoreError> {
        let now = Utc::now();
        let mut expired: Vec<Link> = self
            .rows
            .iter()
            .filter(|row| !row.is_deleted() && row.is_expired_at(now))
            .map(|row| row.clone())
            .collect();

        expired.sort_by_key(|l| (l.expires_at, l.id));
        Ok(expired)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
