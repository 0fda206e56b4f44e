//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Errors
///
/// - 404 Not Found if the code is unknown
/// - 410 Gone if the link was deleted by its owner
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let original_url = state.shortener.find_by_code(&code).await?;

    tracing::debug!(code = %code, "Redirecting");
    Ok(Redirect::temporary(&original_url))
}
