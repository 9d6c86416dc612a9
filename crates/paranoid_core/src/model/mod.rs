//! Record models stored in SQLite.
//!
//! # Responsibility
//! - Define the `Model` contract and the `Record<M>` lifecycle handle.
//! - Provide the bundled models used by the CLI and tests.
//!
//! # Invariants
//! - Every stored record is identified by a stable `RecordId`.
//! - Models with the soft-delete policy keep tombstoned rows in storage.

pub mod draft;
pub mod note;
pub mod record;
pub mod tag;
