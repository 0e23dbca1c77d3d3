//! Integration tests against on-disk and in-memory stores.
//!
//! 1. Record lifecycle (create, reload, partial update, delete)
//! 2. Additive schema migration across store reopen
//! 3. Task factory registration and session-aware fetch

pub mod helpers;
pub mod migration_tests;
pub mod record_lifecycle;
pub mod task_factory_tests;
