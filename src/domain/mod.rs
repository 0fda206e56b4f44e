//! Domain layer containing business entities and logic.
//!
//! This module defines entities, the storage contract and the background delete
//! worker, independent of any concrete backend or transport.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Storage contract implemented by the infrastructure layer
//! - [`backup_event`] - Record format of the in-memory store's append-only log
//! - [`delete_worker`] - Asynchronous soft-delete processing
//!
//! # Delete Processing Flow
//!
//! 1. HTTP handler accepts a delete request and answers `202 Accepted`
//! 2. [`delete_worker::DeleteRequest`] is sent to the worker queue
//! 3. [`delete_worker::run_delete_worker`] applies it via [`repositories::LinkRepository`]
//! 4. On shutdown, the queue is closed and drained before the process exits

pub mod backup_event;
pub mod delete_worker;
pub mod entities;
pub mod repositories;
