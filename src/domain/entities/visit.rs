//! Visit entity representing a single resolved redirect.

use chrono::{DateTime, Utc};

/// A recorded visit to a short link.
///
/// Written once by the visit recorder and never mutated afterwards. Derived
/// fields (`device_type`, `browser`, `os`) come from the user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    pub id: i64,
    pub link_id: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub visited_at: DateTime<Utc>,
}

/// Input data for recording a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisit {
    pub link_id: i64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub visited_at: DateTime<Utc>,
}

impl NewVisit {
    /// Materialises the stored row once the store has assigned an id.
    pub fn into_visit(self, id: i64) -> Visit {
        Visit {
            id,
            link_id: self.link_id,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            referer: self.referer,
            country: self.country,
            city: self.city,
            device_type: self.device_type,
            browser: self.browser,
            os: self.os,
            visited_at: self.visited_at,
        }
    }
}
