//! Handlers for single-URL shortening.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::middleware::identity::{RequestToken, issued_cookie};
use crate::application::services::CreateOutcome;
use crate::error::AppError;
use crate::state::AppState;

fn status_for(outcome: CreateOutcome) -> StatusCode {
    match outcome {
        CreateOutcome::Created => StatusCode::CREATED,
        CreateOutcome::AlreadyExists => StatusCode::CONFLICT,
    }
}

/// Shortens a URL sent as a plain-text body.
///
/// # Endpoint
///
/// `POST /`
///
/// # Response
///
/// The short URL as plain text, with `201 Created` for a new link or
/// `409 Conflict` if the URL was already shortened. A caller without a token
/// receives one in `Set-Cookie`.
///
/// # Errors
///
/// Returns 400 Bad Request for an invalid URL and 401 for an invalid token.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    token: RequestToken,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let session = state.identity.resolve_session(token.as_deref())?;

    let shortened = state.shortener.create(&body, &session.owner_id).await?;

    Ok((
        status_for(shortened.outcome),
        issued_cookie(&session),
        shortened.short_url,
    ))
}

/// Shortens a URL sent as JSON.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com" }
/// ```
///
/// # Response
///
/// ```json
/// { "result": "http://localhost:8080/EAaArVRs5q" }
/// ```
///
/// `201 Created` for a new link, `409 Conflict` with the same body if the URL was
/// already shortened.
///
/// # Errors
///
/// Returns 400 Bad Request for an invalid URL and 401 for an invalid token.
pub async fn shorten_json_handler(
    State(state): State<AppState>,
    token: RequestToken,
    Json(payload): Json<ShortenRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = state.identity.resolve_session(token.as_deref())?;

    let shortened = state.shortener.create(&payload.url, &session.owner_id).await?;

    Ok((
        status_for(shortened.outcome),
        issued_cookie(&session),
        Json(ShortenResponse {
            result: shortened.short_url,
        }),
    ))
}
