//! Handler for the storage health check.

use axum::{extract::State, http::StatusCode};

use crate::error::AppError;
use crate::state::AppState;

/// Checks that the storage backend is reachable.
///
/// # Endpoint
///
/// `GET /ping`
///
/// # Errors
///
/// Returns 500 Internal Server Error if the backend does not answer in time.
pub async fn ping_handler(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.shortener.ping().await?;
    Ok(StatusCode::OK)
}
