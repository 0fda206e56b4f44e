//! Infrastructure layer implementing the domain's storage contract.
//!
//! # Modules
//!
//! - [`persistence`] - In-memory and PostgreSQL repositories plus the backup log

pub mod persistence;
