//! Turns visit metadata into stored visits.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entities::{NewVisit, Visit};
use crate::domain::errors::StoreError;
use crate::domain::repositories::VisitRepository;
use crate::domain::user_agent;
use crate::domain::visit_event::VisitMetadata;

const MAX_IP_LEN: usize = 45;
const MAX_REFERER_LEN: usize = 2048;
const MAX_COUNTRY_LEN: usize = 2;
const MAX_CITY_LEN: usize = 100;

/// Stores one visit per resolved redirect.
///
/// Derives device, browser and OS from the user agent and trims header
/// values to the column widths of `link_visits`. Called from the visit
/// worker, never from the redirect path itself.
pub struct VisitRecorder<V: VisitRepository + ?Sized> {
    visit_repository: Arc<V>,
}

impl<V: VisitRepository + ?Sized> VisitRecorder<V> {
    pub fn new(visit_repository: Arc<V>) -> Self {
        Self { visit_repository }
    }

    /// Records a visit of `link_id`.
    ///
    /// # Errors
    ///
    /// [`StoreError::LinkGone`] if the link was removed in the meantime,
    /// [`StoreError::Database`] on other store failures.
    pub async fn record(
        &self,
        link_id: i64,
        metadata: &VisitMetadata,
        visited_at: DateTime<Utc>,
    ) -> Result<Visit, StoreError> {
        self.visit_repository
            .record(build_visit(link_id, metadata, visited_at))
            .await
    }
}

fn build_visit(link_id: i64, metadata: &VisitMetadata, visited_at: DateTime<Utc>) -> NewVisit {
    let client = user_agent::parse(metadata.user_agent.as_deref());

    NewVisit {
        link_id,
        ip_address: clip(metadata.ip.as_deref(), MAX_IP_LEN),
        user_agent: clip(metadata.user_agent.as_deref(), usize::MAX),
        referer: clip(metadata.referer.as_deref(), MAX_REFERER_LEN),
        country: clip(metadata.country.as_deref(), MAX_COUNTRY_LEN)
            .map(|c| c.to_ascii_uppercase()),
        city: clip(metadata.city.as_deref(), MAX_CITY_LEN),
        device_type: client.device_type.map(str::to_string),
        browser: client.browser.map(str::to_string),
        os: client.os.map(str::to_string),
        visited_at,
    }
}

/// Trims, drops blanks and cuts to `max` characters.
fn clip(value: Option<&str>, max: usize) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    Some(value.chars().take(max).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockVisitRepository;

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_build_visit_derives_client_fields() {
        let metadata = VisitMetadata {
            ip: Some("203.0.113.9".to_string()),
            user_agent: Some(IPHONE_UA.to_string()),
            referer: Some("https://news.example.org/".to_string()),
            country: Some("de".to_string()),
            city: Some("Berlin".to_string()),
        };

        let visit = build_visit(4, &metadata, Utc::now());

        assert_eq!(visit.link_id, 4);
        assert_eq!(visit.device_type.as_deref(), Some("mobile"));
        assert_eq!(visit.browser.as_deref(), Some("Safari"));
        assert_eq!(visit.country.as_deref(), Some("DE"));
        assert_eq!(visit.city.as_deref(), Some("Berlin"));
    }

    #[test]
    fn test_build_visit_without_user_agent() {
        let visit = build_visit(4, &VisitMetadata::default(), Utc::now());

        assert!(visit.user_agent.is_none());
        assert!(visit.device_type.is_none());
        assert!(visit.browser.is_none());
        assert!(visit.os.is_none());
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip(Some("  "), 10), None);
        assert_eq!(clip(None, 10), None);
        assert_eq!(clip(Some(" abc "), 2).as_deref(), Some("ab"));
        let long = "x".repeat(3000);
        assert_eq!(clip(Some(&long), MAX_REFERER_LEN).map(|r| r.len()), Some(2048));
    }

    #[tokio::test]
    async fn test_record_passes_visit_to_store() {
        let mut repo = MockVisitRepository::new();
        repo.expect_record()
            .withf(|v| v.link_id == 8 && v.ip_address.as_deref() == Some("10.0.0.1"))
            .times(1)
            .returning(|v| Ok(v.into_visit(1)));

        let recorder = VisitRecorder::new(Arc::new(repo));
        let metadata = VisitMetadata {
            ip: Some("10.0.0.1".to_string()),
            ..VisitMetadata::default()
        };

        let visit = recorder.record(8, &metadata, Utc::now()).await.unwrap();
        assert_eq!(visit.id, 1);
    }
}
