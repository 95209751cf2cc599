//! Repository trait for visit analytics.

use crate::domain::entities::{NewVisit, Visit};
use crate::domain::errors::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Visits recorded on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyVisits {
    pub date: NaiveDate,
    pub count: i64,
}

/// Visit count for one value of a grouping dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub label: String,
    pub count: i64,
}

/// Derived visit attribute to group counts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitDimension {
    Device,
    Browser,
    Os,
}

impl VisitDimension {
    /// Column holding the attribute in `link_visits`.
    pub fn column(self) -> &'static str {
        match self {
            Self::Device => "device_type",
            Self::Browser => "browser",
            Self::Os => "os",
        }
    }

    /// Reads the attribute from a visit.
    pub fn value_of(self, visit: &Visit) -> Option<&str> {
        match self {
            Self::Device => visit.device_type.as_deref(),
            Self::Browser => visit.browser.as_deref(),
            Self::Os => visit.os.as_deref(),
        }
    }
}

/// Storage for visits and the grouped counts built on them.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgVisitRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryVisitRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Stores a visit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LinkGone`] if the link was removed in the meantime.
    async fn record(&self, new_visit: NewVisit) -> Result<Visit, StoreError>;

    /// Total visits for a link.
    async fn count_visits(&self, link_id: i64) -> Result<i64, StoreError>;

    /// Distinct visitor IP addresses for a link.
    async fn count_unique_visitors(&self, link_id: i64) -> Result<i64, StoreError>;

    /// Visits per day since `since`, newest day first.
    async fn visits_by_day(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyVisits>, StoreError>;

    /// Visits grouped by a derived attribute, largest group first.
    ///
    /// Visits with no value for the attribute are left out.
    async fn count_by(
        &self,
        link_id: i64,
        dimension: VisitDimension,
    ) -> Result<Vec<GroupCount>, StoreError>;
}
