//! DTOs for single-URL shortening endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// JSON request to shorten one URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The original URL to shorten.
    #[validate(length(min = 1, message = "URL must not be empty"))]
    pub url: String,
}

/// JSON response carrying the short URL.
///
/// Returned both for a new link (201) and for an already shortened URL (409).
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}
