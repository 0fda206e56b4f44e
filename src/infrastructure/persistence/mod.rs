//! Link repository implementations.
//!
//! - [`InMemoryLinkRepository`] - Process-local maps, optionally mirrored to a [`BackupLog`]
//! - [`PgLinkRepository`] - PostgreSQL storage with per-call timeouts

pub mod backup_log;
pub mod memory_link_repository;
pub mod pg_link_repository;

pub use backup_log::{BackupError, BackupLog};
pub use memory_link_repository::InMemoryLinkRepository;
pub use pg_link_repository::PgLinkRepository;
