//! Business logic services for the application layer.

pub mod identity_service;
pub mod shortener_service;

pub use identity_service::{IdentityService, Session, TokenStatus};
pub use shortener_service::{
    BatchItem, BatchResult, CreateOutcome, OwnedLink, Shortened, ShortenerService,
};
