//! API route configuration.
//!
//! Identity is resolved per handler from the `Authorization` cookie or bearer header,
//! so no route here sits behind an authentication layer.

use crate::api::handlers::{
    delete_user_urls_handler, list_user_urls_handler, shorten_batch_handler,
    shorten_json_handler, stats_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes nested under `/api`.
///
/// # Endpoints
///
/// - `POST   /shorten`         - Shorten one URL (JSON)
/// - `POST   /shorten/batch`   - Shorten several URLs atomically
/// - `GET    /user/urls`       - List the caller's live links
/// - `DELETE /user/urls`       - Queue deletion of the caller's links
/// - `GET    /internal/stats`  - Service counters for the trusted subnet
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_json_handler))
        .route("/shorten/batch", post(shorten_batch_handler))
        .route(
            "/user/urls",
            get(list_user_urls_handler).delete(delete_user_urls_handler),
        )
        .route("/internal/stats", get(stats_handler))
}
