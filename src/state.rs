//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{IdentityService, ShortenerService};

#[derive(Clone)]
pub struct AppState {
    pub shortener: Arc<ShortenerService>,
    pub identity: Arc<IdentityService>,
}

impl AppState {
    pub fn new(shortener: Arc<ShortenerService>, identity: Arc<IdentityService>) -> Self {
        Self {
            shortener,
            identity,
        }
    }
}
