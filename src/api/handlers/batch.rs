//! Handler for batch shortening.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::api::dto::batch::{BatchRequestItem, BatchResponseItem};
use crate::api::middleware::identity::{RequestToken, issued_cookie};
use crate::application::services::BatchItem;
use crate::error::AppError;
use crate::state::AppState;

/// Shortens several URLs at once.
///
/// # Endpoint
///
/// `POST /api/shorten/batch`
///
/// # Request Body
///
/// ```json
/// [
///   { "correlation_id": "1", "original_url": "https://a.com" },
///   { "correlation_id": "2", "original_url": "https://b.com" }
/// ]
/// ```
///
/// # Response
///
/// `201 Created` with one `{correlation_id, short_url}` per item, in request order.
///
/// # Errors
///
/// The batch is all-or-nothing:
/// - 400 Bad Request if the batch is empty or any URL is invalid
/// - 409 Conflict if any URL is already shortened or repeated
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    token: RequestToken,
    Json(payload): Json<Vec<BatchRequestItem>>,
) -> Result<impl IntoResponse, AppError> {
    for item in &payload {
        item.validate()?;
    }

    let session = state.identity.resolve_session(token.as_deref())?;

    let items: Vec<BatchItem> = payload.into_iter().map(BatchItem::from).collect();
    let results = state
        .shortener
        .create_batch(&items, &session.owner_id)
        .await?;

    let body: Vec<BatchResponseItem> = results.into_iter().map(Into::into).collect();

    Ok((StatusCode::CREATED, issued_cookie(&session), Json(body)))
}
