//! Soft-delete policy.
//!
//! # Responsibility
//! - Let a model opt into tombstone-based deletion.
//! - Keep the policy separate from the SQLite collaborator it drives.
//!
//! # Invariants
//! - Soft-deleted rows are never physically removed by the policy.
//! - Physical removal stays available under separately named operations.

pub mod soft_delete;
