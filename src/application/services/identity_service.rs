//! Anonymous identity issuance and verification.
//!
//! Callers never register. The first request that needs an owner gets a fresh random
//! owner id wrapped in an HS256-signed token; later requests present the token back
//! and are attributed to the same owner until it expires. Owner ids are never stored
//! server-side.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::entities::OwnerId;
use crate::error::AppError;

/// Lifetime of an issued token, in hours.
pub const TOKEN_TTL_HOURS: i64 = 3;

const OWNER_ID_BYTES: usize = 16;

/// Claims carried by an identity token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

/// Outcome of checking a presented token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No token was presented.
    Anonymous,
    /// The token is valid and names this owner.
    Owner(OwnerId),
}

/// The identity a request acts under.
///
/// `issued_token` is set only when a new identity was minted for this request; the
/// transport must hand it back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub owner_id: OwnerId,
    pub issued_token: Option<String>,
}

/// Issues and verifies identity tokens with a single signing key.
pub struct IdentityService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl IdentityService {
    pub fn new(signing_key: &str) -> Self {
        Self::with_ttl(signing_key, Duration::hours(TOKEN_TTL_HOURS))
    }

    pub fn with_ttl(signing_key: &str, token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
            validation,
            token_ttl,
        }
    }

    /// Mints a new owner id and a token naming it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the system RNG or signing fails.
    pub fn issue_token(&self) -> Result<(String, OwnerId), AppError> {
        let owner_id = new_owner_id()?;
        let now = Utc::now();

        let claims = Claims {
            user_id: owner_id.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to sign identity token");
                AppError::internal("Failed to issue token", json!({}))
            })?;

        tracing::debug!(owner_id = %owner_id, "Issued new identity");
        Ok((token, owner_id))
    }

    /// Checks a presented token.
    ///
    /// An empty token means the caller has no identity yet.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is malformed, expired, signed
    /// with another key or carries no owner id.
    pub fn verify_token(&self, token: &str) -> Result<TokenStatus, AppError> {
        if token.is_empty() {
            return Ok(TokenStatus::Anonymous);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected identity token");
            AppError::unauthorized("Invalid token", json!({ "reason": e.to_string() }))
        })?;

        if data.claims.user_id.is_empty() {
            return Err(AppError::unauthorized(
                "Invalid token",
                json!({ "reason": "missing owner id" }),
            ));
        }

        Ok(TokenStatus::Owner(OwnerId::new(data.claims.user_id)))
    }

    /// Resolves the identity a request acts under, minting one if none was presented.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for a presented but invalid token.
    pub fn resolve_session(&self, token: Option<&str>) -> Result<Session, AppError> {
        match self.verify_token(token.unwrap_or_default())? {
            TokenStatus::Owner(owner_id) => Ok(Session {
                owner_id,
                issued_token: None,
            }),
            TokenStatus::Anonymous => {
                let (token, owner_id) = self.issue_token()?;
                Ok(Session {
                    owner_id,
                    issued_token: Some(token),
                })
            }
        }
    }

    /// Resolves the owner of a request without ever minting a new identity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if no valid token was presented.
    pub fn require_owner(&self, token: Option<&str>) -> Result<OwnerId, AppError> {
        match self.verify_token(token.unwrap_or_default())? {
            TokenStatus::Owner(owner_id) => Ok(owner_id),
            TokenStatus::Anonymous => Err(AppError::unauthorized(
                "Authorization token is missing",
                json!({}),
            )),
        }
    }
}

fn new_owner_id() -> Result<OwnerId, AppError> {
    let mut bytes = [0u8; OWNER_ID_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "System RNG unavailable");
        AppError::internal("Failed to generate owner id", json!({}))
    })?;
    Ok(OwnerId::new(hex::encode(bytes)))
}
