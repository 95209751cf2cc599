//! DTOs for the statistics endpoint.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use super::link::LinkResource;
use crate::application::services::LinkStatistics;
use crate::domain::repositories::{DailyVisits, GroupCount};

/// Query parameters for `GET /api/links/{code}/statistics`.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    /// Days covered by `visits_by_day` (default 30).
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct StatisticsBody {
    pub total_visits: i64,
    pub unique_visitors: i64,
    pub visits_by_day: Vec<DailyCount>,
    pub by_device: Vec<NamedCount>,
    pub by_browser: Vec<NamedCount>,
    pub by_os: Vec<NamedCount>,
}

/// Link plus its statistics.
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub link: LinkResource,
    pub statistics: StatisticsBody,
}

impl From<DailyVisits> for DailyCount {
    fn from(day: DailyVisits) -> Self {
        Self {
            date: day.date,
            count: day.count,
        }
    }
}

impl From<GroupCount> for NamedCount {
    fn from(group: GroupCount) -> Self {
        Self {
            name: group.label,
            count: group.count,
        }
    }
}

impl StatisticsResponse {
    pub fn new(stats: LinkStatistics, short_url: String) -> Self {
        let link = LinkResource::new(&stats.link, short_url, stats.summary);

        Self {
            link,
            statistics: StatisticsBody {
                total_visits: stats.summary.total_visits,
                unique_visitors: stats.summary.unique_visitors,
                visits_by_day: stats.visits_by_day.into_iter().map(Into::into).collect(),
                by_device: stats.by_device.into_iter().map(Into::into).collect(),
                by_browser: stats.by_browser.into_iter().map(Into::into).collect(),
                by_os: stats.by_os.into_iter().map(Into::into).collect(),
            },
        }
    }
}
