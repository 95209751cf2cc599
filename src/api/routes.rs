//! API route configuration.

use crate::api::handlers::{
    create_link_handler, delete_link_handler, link_statistics_handler, show_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Link management routes, nested under `/api`.
///
/// # Endpoints
///
/// - `POST   /links`                    - Create a short link
/// - `GET    /links/{code}`             - Link details with visit totals
/// - `DELETE /links/{code}`             - Soft-delete a link
/// - `GET    /links/{code}/statistics`  - Visit breakdown (`?days=`)
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler))
        .route(
            "/links/{code}",
            get(show_link_handler).delete(delete_link_handler),
        )
        .route("/links/{code}/statistics", get(link_statistics_handler))
}
