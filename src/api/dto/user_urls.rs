//! DTOs for listing an owner's links.

use serde::{Deserialize, Serialize};

use crate::application::services::OwnedLink;

#[derive(Debug, Serialize, Deserialize)]
pub struct UserUrlItem {
    pub short_url: String,
    pub original_url: String,
}

impl From<OwnedLink> for UserUrlItem {
    fn from(link: OwnedLink) -> Self {
        Self {
            short_url: link.short_url,
            original_url: link.original_url,
        }
    }
}
