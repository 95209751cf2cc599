//! Visit event model for asynchronous visit recording.

use chrono::{DateTime, Utc};

/// Client metadata captured from a redirect request.
///
/// Every field is optional; missing headers simply leave the value unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitMetadata {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

/// The "visited" signal emitted after a successful resolution.
///
/// Sent from the redirect handler to the background worker over a bounded
/// channel, so the redirect response never waits on the analytics write.
///
/// # Usage Flow
///
/// 1. Created in the redirect handler once the link resolved
/// 2. Sent to the channel with `try_send` (dropped if the queue is full)
/// 3. Picked up by [`crate::application::workers::run_visit_worker`]
/// 4. Persisted by [`crate::application::services::VisitRecorder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitEvent {
    pub link_id: i64,
    pub short_code: String,
    pub metadata: VisitMetadata,
    pub occurred_at: DateTime<Utc>,
}

impl VisitEvent {
    /// Creates an event stamped with the current time.
    pub fn new(link_id: i64, short_code: impl Into<String>, metadata: VisitMetadata) -> Self {
        Self {
            link_id,
            short_code: short_code.into(),
            metadata,
            occurred_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_event_creation_full() {
        let before = Utc::now();
        let event = VisitEvent::new(
            42,
            "abc1234",
            VisitMetadata {
                ip: Some("192.168.1.1".to_string()),
                user_agent: Some("Mozilla/5.0".to_string()),
                referer: Some("https://google.com".to_string()),
                country: Some("DE".to_string()),
                city: None,
            },
        );

        assert_eq!(event.link_id, 42);
        assert_eq!(event.short_code, "abc1234");
        assert_eq!(event.metadata.ip.as_deref(), Some("192.168.1.1"));
        assert_eq!(event.metadata.country.as_deref(), Some("DE"));
        assert!(event.occurred_at >= before);
    }

    #[test]
    fn test_visit_event_creation_minimal() {
        let event = VisitEvent::new(1, "xyz7890".to_string(), VisitMetadata::default());

        assert!(event.metadata.ip.is_none());
        assert!(event.metadata.user_agent.is_none());
        assert!(event.metadata.referer.is_none());
    }
}
