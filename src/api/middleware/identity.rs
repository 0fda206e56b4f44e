//! Identity token plumbing for handlers.
//!
//! [`RequestToken`] pulls the presented token out of the request without judging it;
//! handlers hand it to [`crate::application::services::IdentityService`], which
//! decides whether to reuse, mint or reject. When a token is minted,
//! [`issued_cookie`] turns it into a `Set-Cookie` header on the response.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use axum::response::AppendHeaders;

use crate::application::services::{Session, identity_service::TOKEN_TTL_HOURS};
use crate::utils::extract_token::{AUTH_COOKIE, extract_token_from_headers};

/// The identity token presented with a request, if any.
///
/// Never rejects: a missing token is `None` and validation is left to the service.
#[derive(Debug, Clone, Default)]
pub struct RequestToken(pub Option<String>);

impl RequestToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(extract_token_from_headers(&parts.headers)))
    }
}

/// Builds the `Set-Cookie` header for a freshly minted token.
///
/// Returns `None` when the session reused an existing token.
pub fn issued_cookie(
    session: &Session,
) -> Option<AppendHeaders<[(header::HeaderName, String); 1]>> {
    session.issued_token.as_ref().map(|token| {
        AppendHeaders([(
            header::SET_COOKIE,
            format!(
                "{AUTH_COOKIE}={token}; Path=/; HttpOnly; Max-Age={}",
                TOKEN_TTL_HOURS * 3600
            ),
        )])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OwnerId;

    #[test]
    fn test_no_cookie_for_reused_token() {
        let session = Session {
            owner_id: OwnerId::from("u1"),
            issued_token: None,
        };

        assert!(issued_cookie(&session).is_none());
    }

    #[test]
    fn test_cookie_for_minted_token() {
        let session = Session {
            owner_id: OwnerId::from("u1"),
            issued_token: Some("tok".to_string()),
        };

        let AppendHeaders([(name, value)]) = issued_cookie(&session).unwrap();

        assert_eq!(name, header::SET_COOKIE);
        assert!(value.starts_with("Authorization=tok;"));
        assert!(value.contains("HttpOnly"));
    }
}
