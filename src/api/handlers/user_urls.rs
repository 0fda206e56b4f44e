//! Handlers for the caller's own links.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::dto::user_urls::UserUrlItem;
use crate::api::middleware::identity::{RequestToken, issued_cookie};
use crate::error::AppError;
use crate::state::AppState;

/// Lists the live links created by the caller.
///
/// # Endpoint
///
/// `GET /api/user/urls`
///
/// # Response
///
/// - 200 OK with `[{ "short_url", "original_url" }]`
/// - 204 No Content if the caller has no live links; a caller without a token gets
///   a new identity and therefore always lands here
///
/// # Errors
///
/// Returns 401 Unauthorized for an invalid or expired token.
pub async fn list_user_urls_handler(
    State(state): State<AppState>,
    token: RequestToken,
) -> Result<Response, AppError> {
    let session = state.identity.resolve_session(token.as_deref())?;

    let links = state.shortener.find_all_by_owner(&session.owner_id).await?;

    if links.is_empty() {
        return Ok((StatusCode::NO_CONTENT, issued_cookie(&session), ()).into_response());
    }

    let body: Vec<UserUrlItem> = links.into_iter().map(Into::into).collect();
    Ok((StatusCode::OK, issued_cookie(&session), Json(body)).into_response())
}

/// Accepts deletion of some of the caller's links.
///
/// # Endpoint
///
/// `DELETE /api/user/urls`
///
/// # Request Body
///
/// ```json
/// ["EAaArVRs5q", "qW3rTy8UiO"]
/// ```
///
/// # Response
///
/// 202 Accepted as soon as the request is queued. Codes the caller does not own are
/// silently ignored.
///
/// # Errors
///
/// Returns 401 Unauthorized if no valid token is presented; no identity is minted.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    token: RequestToken,
    Json(codes): Json<Vec<String>>,
) -> Result<StatusCode, AppError> {
    let owner_id = state.identity.require_owner(token.as_deref())?;

    state.shortener.delete_async(codes, owner_id)?;

    Ok(StatusCode::ACCEPTED)
}
