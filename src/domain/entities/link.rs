//! Link entity representing a shortened URL mapping.

use super::OwnerId;

/// A stored short link.
///
/// Links are never updated except by soft delete and never physically removed.
/// `is_deleted` only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub code: String,
    pub original_url: String,
    pub owner_id: OwnerId,
    pub is_deleted: bool,
}

impl Link {
    /// Creates a new, not yet deleted link.
    pub fn new(code: String, original_url: String, owner_id: OwnerId) -> Self {
        Self {
            code,
            original_url,
            owner_id,
            is_deleted: false,
        }
    }
}

/// Input data for persisting one link of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub code: String,
    pub original_url: String,
}

/// Result of a single save.
///
/// A duplicate URL is a defined outcome rather than an error: the code is derived
/// from the URL, so the caller can still answer with the canonical short URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Duplicate,
}
