//! PostgreSQL implementation of visit repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use super::{map_sqlx_error, map_visit_error};
use crate::domain::entities::{NewVisit, Visit};
use crate::domain::errors::StoreError;
use crate::domain::repositories::{DailyVisits, GroupCount, VisitDimension, VisitRepository};

#[derive(Debug, FromRow)]
struct VisitRow {
    id: i64,
    link_id: i64,
    ip_address: Option<String>,
    user_agent: Option<String>,
    referer: Option<String>,
    country: Option<String>,
    city: Option<String>,
    device_type: Option<String>,
    browser: Option<String>,
    os: Option<String>,
    visited_at: DateTime<Utc>,
}

impl From<VisitRow> for Visit {
    fn from(row: VisitRow) -> Self {
        Visit {
            id: row.id,
            link_id: row.link_id,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            referer: row.referer,
            country: row.country,
            city: row.city,
            device_type: row.device_type,
            browser: row.browser,
            os: row.os,
            visited_at: row.visited_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct DailyRow {
    day: NaiveDate,
    total: i64,
}

#[derive(Debug, FromRow)]
struct GroupRow {
    label: Option<String>,
    total: i64,
}

/// PostgreSQL repository for visit recording and aggregation.
pub struct PgVisitRepository {
    pool: Arc<PgPool>,
}

impl PgVisitRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitRepository for PgVisitRepository {
    async fn record(&self, new_visit: NewVisit) -> Result<Visit, StoreError> {
        let link_id = new_visit.link_id;

        let row = sqlx::query_as::<_, VisitRow>(
            r#"
            INSERT INTO link_visits
                (link_id, ip_address, user_agent, referer, country, city,
                 device_type, browser, os, visited_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, link_id, ip_address, user_agent, referer, country, city,
                      device_type, browser, os, visited_at
            "#,
        )
        .bind(new_visit.link_id)
        .bind(new_visit.ip_address)
        .bind(new_visit.user_agent)
        .bind(new_visit.referer)
        .bind(new_visit.country)
        .bind(new_visit.city)
        .bind(new_visit.device_type)
        .bind(new_visit.browser)
        .bind(new_visit.os)
        .bind(new_visit.visited_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| map_visit_error(e, link_id))?;

        Ok(row.into())
    }

    async fn count_visits(&self, link_id: i64) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM link_visits WHERE link_id = $1")
            .bind(link_id)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| map_sqlx_error(e, ""))
    }

    async fn count_unique_visitors(&self, link_id: i64) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT ip_address) FROM link_visits WHERE link_id = $1",
        )
        .bind(link_id)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, ""))
    }

    async fn visits_by_day(
        &self,
        link_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyVisits>, StoreError> {
        let rows = sqlx::query_as::<_, DailyRow>(
            r#"
            SELECT (visited_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS total
            FROM link_visits
            WHERE link_id = $1 AND visited_at >= $2
            GROUP BY day
            ORDER BY day DESC
            "#,
        )
        .bind(link_id)
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, ""))?;

        Ok(rows
            .into_iter()
            .map(|r| DailyVisits {
                date: r.day,
                count: r.total,
            })
            .collect())
    }

    async fn count_by(
        &self,
        link_id: i64,
        dimension: VisitDimension,
    ) -> Result<Vec<GroupCount>, StoreError> {
        // Column name comes from a closed enum, never from input.
        let column = dimension.column();
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            SELECT {column} AS label, COUNT(*) AS total
            FROM link_visits
            WHERE link_id = $1 AND {column} IS NOT NULL
            GROUP BY {column}
            ORDER BY total DESC, label
            "#
        ))
        .bind(link_id)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error(e, ""))?;

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                r.label.map(|label| GroupCount {
                    label,
                    count: r.total,
                })
            })
            .collect())
    }
}
