//! Identity token extraction from HTTP request headers.

use axum::http::{HeaderMap, header};

/// Name of the cookie carrying the identity token.
pub const AUTH_COOKIE: &str = "Authorization";

/// Extracts the identity token from request headers.
///
/// Looks for an `Authorization` cookie first, then for an
/// `Authorization: Bearer <token>` header. Empty values count as absent.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, "theme=dark; Authorization=abc".parse().unwrap());
///
/// assert_eq!(extract_token_from_headers(&headers).as_deref(), Some("abc"));
/// ```
pub fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    token_from_cookie(headers).or_else(|| token_from_bearer(headers))
}

fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(AUTH_COOKIE), Some(value)) if !value.is_empty() => Some(value.to_string()),
                _ => None,
            }
        })
}

fn token_from_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
