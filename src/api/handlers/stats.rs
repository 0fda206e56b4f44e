//! Handler for internal service statistics.

use axum::{Json, extract::State, http::HeaderMap};

use crate::api::dto::stats::StatsResponse;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::extract_real_ip::extract_real_ip;

/// Returns the number of shortened URLs and distinct owners.
///
/// # Endpoint
///
/// `GET /api/internal/stats`
///
/// The caller address is read from `X-Real-IP` and must lie inside the configured
/// trusted subnet.
///
/// # Response
///
/// ```json
/// { "urls": 42, "users": 7 }
/// ```
///
/// # Errors
///
/// Returns 403 Forbidden if no trusted subnet is configured or the caller is outside it.
pub async fn stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state
        .shortener
        .collect_stats(extract_real_ip(&headers))
        .await?;

    Ok(Json(stats.into()))
}
