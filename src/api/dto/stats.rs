//! DTOs for the internal statistics endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::entities::Statistics;

/// Service-wide counters.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Distinct shortened URLs.
    pub urls: i64,
    /// Distinct owners.
    pub users: i64,
}

impl From<Statistics> for StatsResponse {
    fn from(stats: Statistics) -> Self {
        Self {
            urls: stats.urls,
            users: stats.users,
        }
    }
}
