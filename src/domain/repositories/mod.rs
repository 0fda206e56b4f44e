//! Repository trait definitions for the domain layer.
//!
//! The storage contract is expressed once as [`LinkRepository`]; concrete backends
//! live in `crate::infrastructure::persistence` and are chosen at startup.
//!
//! # Implementations
//!
//! - [`crate::infrastructure::persistence::InMemoryLinkRepository`] - indexes in memory,
//!   durable through an append-only backup log
//! - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL table with
//!   constraints and transactions
//!
//! Mock implementations are auto-generated via `mockall` for testing.

pub mod link_repository;

pub use link_repository::LinkRepository;

#[cfg(test)]
pub use link_repository::MockLinkRepository;
