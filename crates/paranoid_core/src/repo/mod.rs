//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence primitives consumed by the soft-delete policy.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository full writes enforce `Model::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `FrozenRecord`) in
//!   addition to DB transport errors.

pub mod callbacks;
pub mod record_repo;
pub mod scope;
