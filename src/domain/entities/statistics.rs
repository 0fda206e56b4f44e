//! Aggregate service statistics.

use serde::Serialize;

/// Counts of distinct stored URLs and distinct owners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub urls: i64,
    pub users: i64,
}
