//! In-memory implementation of visit repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use super::MemoryLinkRepository;
use super::memory_link_repository::VisitTable;
use crate::domain::entities::{NewVisit, Visit};
use crate::domain::errors::StoreError;
use crate::domain::repositories::{DailyVisits, GroupCount, VisitDimension, VisitRepository};

/// Visit store held in process memory, grouped by link id.
///
/// Recording a visit for a link that is no longer in `links` fails with
/// [`StoreError::LinkGone`], mirroring the foreign key of the SQL schema.
/// The visit table is owned by `links`, which clears a link's visits when the
/// link is hard-deleted.
pub struct MemoryVisitRepository {
    links: Arc<MemoryLinkRepository>,
    visits: Arc<VisitTable>,
    next_id: AtomicI64,
}

impl MemoryVisitRepository {
    pub fn new(links: Arc<MemoryLinkRepository>) -> Self {
        Self {
            visits: links.visit_table(),
            links,
            next_id: AtomicI64::new(1),
        }
    }

    fn with_visits<T>(&self, link_id: i64, f: impl FnOnce(&[Visit]) -> T) -> T {
        match self.visits.get(&link_id) {
            Some(visits) => f(visits.as_slice()),
            None => f(&[]),
        }
    }
}

#[async_trait]
impl VisitRepository for MemoryVisitRepository {
    async fn record(&self, new_visit: NewVisit) -> Result<Visit, StoreError> {
        let link_id = new_visit.link_id;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let visit = new_visit.into_visit(id);

        // The row is held while pushing, so a delete cannot slip in between.
        self.links
            .with_row(link_id, || {
                self.visits
                    .entry(link_id)
                    .or_default()
                    .push(visit.clone());
            })
            .ok_or(StoreError::LinkGone(link_id))?;

        Ok(visit)
    }

    async fn count_visits(&self, link_id: i64) -> Result<i64, StoreError> {
        Ok(self.with_visits(link_id, |v| v.len() as i64))
    }

    async fn count_unique_visitors(&self, link_id: i64) -> Result<i64, StoreError> {
        Ok(self.with_visits(link_id, |v| {
            v.iter()
                .filter_map(|visit| visit.ip_address.as_deref())
                .collect::<HashSet<_>>()
                .len() as i64
        }))
    }

    async fn visits_by_day(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyVisits>, StoreError> {
        let per_day = self.with_visits(link_id, |v| {
            let mut per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
            for visit in v.iter().filter(|visit| visit.visited_at >= since) {
                *per_day.entry(visit.visited_at.date_naive()).or_default() += 1;
            }
            per_day
        });

        Ok(per_day
            .into_iter()
            .rev()
            .map(|(date, count)| DailyVisits { date, count })
            .collect())
    }

    async fn count_by(
        &self,
        link_id: i64,
        dimension: VisitDimension,
    ) -> Result<Vec<GroupCount>, StoreError> {
        let counts = self.with_visits(link_id, |v| {
            let mut counts: HashMap<String, i64> = HashMap::new();
            for label in v.iter().filter_map(|visit| dimension.value_of(visit)) {
                *counts.entry(label.to_string()).or_default() += 1;
            }
            counts
        });

        let mut groups: Vec<GroupCount> = counts
            .into_iter()
            .map(|(label, count)| GroupCount { label, count })
            .collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        Ok(groups)
    }
}
