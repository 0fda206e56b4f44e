//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A stored mapping from short code to original URL
//! - [`NewLink`] - A code/URL pair about to be persisted
//! - [`OwnerId`] - The anonymous identity a link is attributed to
//! - [`Statistics`] - Aggregate counters exposed to trusted callers

pub mod link;
pub mod owner;
pub mod statistics;

pub use link::{Link, NewLink, SaveOutcome};
pub use owner::OwnerId;
pub use statistics::Statistics;
