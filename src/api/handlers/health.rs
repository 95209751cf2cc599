//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Link store ping
/// 2. **Visit Queue**: Channel open, free slots
/// 3. **Cache**: Backend health check
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;
    let queue_check = check_visit_queue(&state);
    let cache_check = check_cache(&state).await;

    let all_healthy = db_check.is_ok() && queue_check.is_ok() && cache_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            visit_queue: queue_check,
            cache: cache_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.link_repository.ping().await {
        Ok(()) => CheckStatus::ok("Connected"),
        Err(e) => CheckStatus::error(format!("Database error: {}", e)),
    }
}

fn check_visit_queue(state: &AppState) -> CheckStatus {
    if state.visit_sender.is_closed() {
        CheckStatus::error("Visit queue is closed")
    } else {
        CheckStatus::ok(format!(
            "Free slots: {}/{}",
            state.visit_sender.capacity(),
            state.visit_sender.max_capacity()
        ))
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    let backend = state.cache.backend();

    if state.cache.health_check().await {
        CheckStatus::ok(format!("Backend: {}", backend))
    } else {
        CheckStatus::error(format!("Backend {} unreachable", backend))
    }
}
