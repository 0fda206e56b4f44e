//! Backup event model for the in-memory store's append-only log.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{Link, OwnerId};

/// A durable mirror of one write to the in-memory store.
///
/// Serialized as one JSON object per line. Events are never rewritten; the store is
/// rebuilt on startup by replaying them in file order.
///
/// A save produces an event with `is_deleted: false` (the field is omitted on disk).
/// A soft delete appends a second event for the same code with `is_deleted: true`,
/// so the deleted flag survives a restart.
///
/// # Examples
///
/// ```ignore
/// let event = BackupEvent::created("abcdEFGH12", "https://example.com", &owner);
/// // {"short_url":"abcdEFGH12","original_url":"https://example.com","user_id":"..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEvent {
    pub short_url: String,
    pub original_url: String,
    pub user_id: OwnerId,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_deleted: bool,
}

impl BackupEvent {
    /// Event recording a newly saved link.
    pub fn created(short_url: &str, original_url: &str, user_id: &OwnerId) -> Self {
        Self {
            short_url: short_url.to_string(),
            original_url: original_url.to_string(),
            user_id: user_id.clone(),
            is_deleted: false,
        }
    }

    /// Tombstone recording that an existing link was soft-deleted.
    pub fn deleted(link: &Link) -> Self {
        Self {
            short_url: link.code.clone(),
            original_url: link.original_url.clone(),
            user_id: link.owner_id.clone(),
            is_deleted: true,
        }
    }
}
