//! Visit statistics for links.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::entities::Link;
use crate::domain::errors::{LinkError, StoreError};
use crate::domain::repositories::{
    DailyVisits, GroupCount, LinkRepository, VisitDimension, VisitRepository,
};

/// Days covered by `visits_by_day` when the caller does not say.
pub const DEFAULT_STATS_DAYS: u32 = 30;

/// Upper bound for the daily breakdown window.
pub const MAX_STATS_DAYS: u32 = 365;

/// Visit totals shown alongside a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitSummary {
    pub total_visits: i64,
    pub unique_visitors: i64,
}

/// Full statistics for one link.
#[derive(Debug, Clone)]
pub struct LinkStatistics {
    pub link: Link,
    pub summary: VisitSummary,
    /// Newest day first.
    pub visits_by_day: Vec<DailyVisits>,
    pub by_device: Vec<GroupCount>,
    pub by_browser: Vec<GroupCount>,
    pub by_os: Vec<GroupCount>,
}

/// Aggregates recorded visits per link.
///
/// Statistics are available for every live (not soft-deleted) link, including
/// expired ones that the sweep has not removed yet.
pub struct StatisticsService<L: LinkRepository + ?Sized, V: VisitRepository + ?Sized> {
    link_repository: Arc<L>,
    visit_repository: Arc<V>,
}

impl<L: LinkRepository + ?Sized, V: VisitRepository + ?Sized> StatisticsService<L, V> {
    pub fn new(link_repository: Arc<L>, visit_repository: Arc<V>) -> Self {
        Self {
            link_repository,
            visit_repository,
        }
    }

    /// Returns grouped visit counts for `code`.
    ///
    /// `days` bounds the daily breakdown (default 30, clamped to 1..=365).
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::NotFound`] if no live link has this code.
    pub async fn statistics(&self, code: &str, days: Option<u32>) -> Result<LinkStatistics, LinkError> {
        let link = self
            .link_repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| LinkError::NotFound(code.to_string()))?;

        let days = days.unwrap_or(DEFAULT_STATS_DAYS).clamp(1, MAX_STATS_DAYS);
        let since = Utc::now() - Duration::days(i64::from(days));
        let visits = self.visit_repository.as_ref();

        let (summary, visits_by_day, by_device, by_browser, by_os) = tokio::try_join!(
            self.summary(link.id),
            visits.visits_by_day(link.id, since),
            visits.count_by(link.id, VisitDimension::Device),
            visits.count_by(link.id, VisitDimension::Browser),
            visits.count_by(link.id, VisitDimension::Os),
        )?;

        Ok(LinkStatistics {
            link,
            summary,
            visits_by_day,
            by_device,
            by_browser,
            by_os,
        })
    }

    /// Total and unique-by-IP visit counts for a link.
    pub async fn visit_summary(&self, link_id: i64) -> Result<VisitSummary, LinkError> {
        Ok(self.summary(link_id).await?)
    }

    async fn summary(&self, link_id: i64) -> Result<VisitSummary, StoreError> {
        let (total_visits, unique_visitors) = tokio::try_join!(
            self.visit_repository.count_visits(link_id),
            self.visit_repository.count_unique_visitors(link_id),
        )?;

        Ok(VisitSummary {
            total_visits,
            unique_visitors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockLinkRepository, MockVisitRepository};

    fn link(code: &str) -> Link {
        Link::new(
            9,
            "https://example.com".to_string(),
            code.to_string(),
            Some(Utc::now() - Duration::days(1)),
            Utc::now() - Duration::days(2),
            None,
        )
    }

    fn group(label: &str, count: i64) -> GroupCount {
        GroupCount {
            label: label.to_string(),
            count,
        }
    }

    #[tokio::test]
    async fn test_statistics_for_expired_link() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .times(1)
            .returning(|code| Ok(Some(link(code))));

        let mut visits = MockVisitRepository::new();
        visits.expect_count_visits().returning(|_| Ok(12));
        visits.expect_count_unique_visitors().returning(|_| Ok(4));
        visits
            .expect_visits_by_day()
            .withf(|id, since| {
                *id == 9 && (Utc::now() - *since - Duration::days(30)).num_seconds().abs() < 5
            })
            .returning(|_, _| {
                Ok(vec![DailyVisits {
                    date: Utc::now().date_naive(),
                    count: 12,
                }])
            });
        visits.expect_count_by().returning(|_, dimension| {
            Ok(match dimension {
                VisitDimension::Device => vec![group("desktop", 8), group("mobile", 4)],
                VisitDimension::Browser => vec![group("Chrome", 12)],
                VisitDimension::Os => vec![],
            })
        });

        let service = StatisticsService::new(Arc::new(links), Arc::new(visits));
        let stats = service.statistics("old1234", None).await.unwrap();

        assert_eq!(stats.link.short_code, "old1234");
        assert_eq!(stats.summary.total_visits, 12);
        assert_eq!(stats.summary.unique_visitors, 4);
        assert_eq!(stats.visits_by_day.len(), 1);
        assert_eq!(stats.by_device[0], group("desktop", 8));
        assert_eq!(stats.by_browser.len(), 1);
        assert!(stats.by_os.is_empty());
    }

    #[tokio::test]
    async fn test_statistics_unknown_code() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_code().returning(|_| Ok(None));

        let service = StatisticsService::new(Arc::new(links), Arc::new(MockVisitRepository::new()));
        let err = service.statistics("missing", Some(7)).await.unwrap_err();

        assert!(matches!(err, LinkError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_days_are_clamped() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_code().returning(|code| Ok(Some(link(code))));

        let mut visits = MockVisitRepository::new();
        visits.expect_count_visits().returning(|_| Ok(0));
        visits.expect_count_unique_visitors().returning(|_| Ok(0));
        visits
            .expect_visits_by_day()
            .withf(|_, since| (Utc::now() - *since) <= Duration::days(365) + Duration::seconds(5))
            .times(1)
            .returning(|_, _| Ok(vec![]));
        visits.expect_count_by().returning(|_, _| Ok(vec![]));

        let service = StatisticsService::new(Arc::new(links), Arc::new(visits));
        let stats = service.statistics("clamp12", Some(10_000)).await.unwrap();
        assert_eq!(stats.summary, VisitSummary::default());
    }
}
