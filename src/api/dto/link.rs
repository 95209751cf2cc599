//! DTOs for link endpoints.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::application::services::VisitSummary;
use crate::domain::entities::Link;

/// Custom codes: 6-10 ASCII letters or digits.
static SHORT_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z]{6,10}$").expect("short code pattern is valid"));

/// Longest accepted lifetime: one year.
pub const MAX_TTL_MINUTES: u32 = 525_600;

/// Request to shorten a URL.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// Absolute http(s) URL, at most 2048 characters.
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Minutes until the link expires. Absent means never.
    #[validate(range(min = 1, max = 525_600, message = "TTL must be between 1 and 525600 minutes"))]
    pub ttl_minutes: Option<u32>,

    #[validate(regex(
        path = *SHORT_CODE_REGEX,
        message = "Custom code must be 6-10 letters or digits"
    ))]
    pub custom_code: Option<String>,
}

/// Success envelope shared by the JSON endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Public representation of a link.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LinkResource {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub visits_count: i64,
    pub unique_visitors: i64,
    pub is_active: bool,
    pub is_expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LinkResource {
    pub fn new(link: &Link, short_url: String, summary: VisitSummary) -> Self {
        Self {
            id: link.id,
            original_url: link.original_url.clone(),
            short_code: link.short_code.clone(),
            short_url,
            visits_count: summary.total_visits,
            unique_visitors: summary.unique_visitors,
            is_active: link.is_active(),
            is_expired: link.is_expired(),
            expires_at: link.expires_at,
            created_at: link.created_at,
        }
    }
}
