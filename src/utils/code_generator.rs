//! Deterministic short code derivation.
//!
//! A code is the first [`CODE_LENGTH`] characters of the URL-safe base64 encoding of
//! the SHA-256 digest of the URL. The same URL always yields the same code, which is
//! what lets a duplicate create still answer with the canonical short URL.
//!
//! Truncation leaves a birthday-bound chance that two distinct URLs share a code.
//! Storage refuses to let the second URL overwrite the first; it is rejected with a
//! conflict instead of being resolved.

use base64::Engine as _;
use serde_json::json;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::AppError;

/// Number of characters kept from the encoded digest.
pub const CODE_LENGTH: usize = 10;

/// Errors that make a URL unusable for shortening.
#[derive(Debug, thiserror::Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("URL must contain a host")]
    MissingHost,
}

/// Computes the short code for a URL.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the URL lacks a scheme or a host.
///
/// # Examples
///
/// ```ignore
/// let code = compute_code("https://example.com/a")?;
/// assert_eq!(code.len(), 10);
/// assert_eq!(code, compute_code("https://example.com/a")?);
/// ```
pub fn compute_code(original_url: &str) -> Result<String, AppError> {
    validate_url(original_url).map_err(|e| {
        AppError::bad_request(
            "Invalid URL",
            json!({ "url": original_url, "reason": e.to_string() }),
        )
    })?;

    Ok(hash_code(original_url))
}

/// Checks that a URL has both a scheme and a host.
pub fn validate_url(original_url: &str) -> Result<(), UrlValidationError> {
    let parsed =
        Url::parse(original_url).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(UrlValidationError::MissingHost),
    }
}

fn hash_code(original_url: &str) -> String {
    let digest = Sha256::digest(original_url.as_bytes());
    let mut encoded = base64::engine::general_purpose::URL_SAFE.encode(digest);
    encoded.truncate(CODE_LENGTH);
    encoded
}
