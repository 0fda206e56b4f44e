//! Application layer services implementing business logic.
//!
//! Services consume the repository trait and the delete queue and give HTTP handlers
//! one call per operation.
//!
//! # Available Services
//!
//! - [`services::shortener_service::ShortenerService`] - Create, resolve, list, delete and stats
//! - [`services::identity_service::IdentityService`] - Anonymous identity tokens
pub mod services;
