//! Handlers for link management endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::link::{ApiResponse, CreateLinkRequest, LinkResource};
use crate::api::dto::statistics::{StatisticsQuery, StatisticsResponse};
use crate::application::services::VisitSummary;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/page",
///   "ttl_minutes": 60,        // optional, 1..=525600
///   "custom_code": "promo2025" // optional, 6-10 letters or digits
/// }
/// ```
///
/// # Errors
///
/// - 422 on invalid input
/// - 409 if `custom_code` is taken
/// - 503 if no free code could be generated
pub async fn create_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LinkResource>>), AppError> {
    payload.validate()?;

    let link = state
        .shortener
        .shorten(
            &payload.url,
            payload.ttl_minutes,
            payload.custom_code.as_deref(),
        )
        .await?;

    let resource = LinkResource::new(
        &link,
        state.short_url(&link.short_code),
        VisitSummary::default(),
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(resource, "Link created successfully")),
    ))
}

/// Returns an active link with its visit totals.
///
/// # Endpoint
///
/// `GET /api/links/{code}`
///
/// # Errors
///
/// - 404 if the code is unknown or deleted
/// - 410 if the link has expired
pub async fn show_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LinkResource>>, AppError> {
    let link = state.resolver.get_details(&code).await?;
    let summary = state.statistics.visit_summary(link.id).await?;

    Ok(Json(ApiResponse::ok(LinkResource::new(
        &link,
        state.short_url(&link.short_code),
        summary,
    ))))
}

/// Returns visit statistics for a link.
///
/// # Endpoint
///
/// `GET /api/links/{code}/statistics?days=30`
///
/// Works for expired links too, as long as they have not been swept.
///
/// # Errors
///
/// - 404 if the code is unknown or deleted
pub async fn link_statistics_handler(
    Path(code): Path<String>,
    Query(query): Query<StatisticsQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StatisticsResponse>>, AppError> {
    let stats = state.statistics.statistics(&code, query.days).await?;
    let short_url = state.short_url(&stats.link.short_code);

    Ok(Json(ApiResponse::ok(StatisticsResponse::new(stats, short_url))))
}

/// Soft-deletes a link.
///
/// # Endpoint
///
/// `DELETE /api/links/{code}`
///
/// # Response Codes
///
/// - **204 No Content**: Link deleted
/// - **404 Not Found**: Unknown or already deleted code
pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.shortener.delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
