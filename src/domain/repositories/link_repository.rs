//! Repository trait for short link data access.

use crate::domain::entities::{Link, NewLink, OwnerId, SaveOutcome, Statistics};
use crate::error::AppError;
use async_trait::async_trait;

/// Storage contract for short links.
///
/// Every implementation guarantees at most one stored link per distinct original URL
/// and never physically removes rows; deletion only flips `is_deleted`.
///
/// # Examples
///
/// See integration tests: `tests/repository_memory.rs`, `tests/repository_pg.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Persists a single link unless the URL is already stored.
    ///
    /// # Returns
    ///
    /// - `Ok(SaveOutcome::Created)` if a new row was written
    /// - `Ok(SaveOutcome::Duplicate)` if the URL already had a link
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the code is taken by a different URL.
    /// Returns [`AppError::Internal`] on storage failures or timeouts.
    async fn save(
        &self,
        code: &str,
        original_url: &str,
        owner_id: &OwnerId,
    ) -> Result<SaveOutcome, AppError>;

    /// Finds a link by its short code, including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failures or timeouts.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Lists the links created by an owner that have not been deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failures or timeouts.
    async fn find_all_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Link>, AppError>;

    /// Persists a batch of links as one all-or-nothing unit.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if any URL or code is already stored (or repeated
    /// inside the batch); nothing from the batch is persisted in that case.
    /// Returns [`AppError::Internal`] on storage failures or timeouts.
    async fn save_batch(&self, links: &[NewLink], owner_id: &OwnerId) -> Result<(), AppError>;

    /// Marks as deleted every link whose code is in `codes` and which belongs to
    /// `owner_id`. Codes owned by someone else are left untouched.
    ///
    /// Returns the number of links that changed state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failures or timeouts.
    async fn soft_delete(&self, codes: &[String], owner_id: &OwnerId) -> Result<u64, AppError>;

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the backend cannot be reached in time.
    async fn ping(&self) -> Result<(), AppError>;

    /// Counts distinct stored URLs and distinct owners.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage failures or timeouts.
    async fn collect_stats(&self) -> Result<Statistics, AppError>;
}
