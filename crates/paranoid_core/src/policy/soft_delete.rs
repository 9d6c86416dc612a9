//! Soft-delete installation options and record contract.
//!
//! # Responsibility
//! - Describe how a model opts into soft-delete semantics.
//! - Define the `SoftDeletable` contract implemented by record handles.
//! - Provide type-level query helpers for deleted/active partitions.
//!
//! # Invariants
//! - `deleted_at = NULL` means active; any value is the deletion time.
//! - Installation is a compile-time declaration on the model type.
//! - `only_deleted`, `with_deleted` and `without_deleted` are mutually
//!   exclusive: each one replaces any deletion filter set before it.

use crate::model::record::Model;
use crate::repo::scope::Scope;

/// Column holding the soft-delete tombstone (epoch milliseconds).
pub const DELETED_AT_COLUMN: &str = "deleted_at";

/// Installation options for the soft-delete policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftDeleteOptions {
    /// When `true`, ordinary queries return deleted rows too.
    pub disable_default_scope: bool,
}

impl SoftDeleteOptions {
    /// Default installation: deleted rows are hidden from ordinary queries.
    pub const fn new() -> Self {
        Self {
            disable_default_scope: false,
        }
    }

    /// Installation that keeps deleted rows visible unless filtered.
    pub const fn without_default_scope() -> Self {
        Self {
            disable_default_scope: true,
        }
    }
}

/// Installs the soft-delete policy on a model.
///
/// Meant to be assigned to `Model::SOFT_DELETE`:
///
/// ```
/// use paranoid_core::{enable_soft_delete, SoftDeleteOptions};
///
/// const SOFT_DELETE: Option<SoftDeleteOptions> =
///     enable_soft_delete(SoftDeleteOptions::new());
/// assert!(SOFT_DELETE.is_some());
/// ```
pub const fn enable_soft_delete(options: SoftDeleteOptions) -> Option<SoftDeleteOptions> {
    Some(options)
}

/// In-memory side of the soft-delete contract.
///
/// Storage writes are issued by `RecordService`; implementors only keep the
/// handle's tombstone in sync with what was written.
pub trait SoftDeletable {
    /// Records the deletion time on the handle.
    fn mark_deleted(&mut self, now_epoch_ms: i64);
    /// Clears the deletion time on the handle.
    fn mark_restored(&mut self);
    /// Returns the tombstone value, if any.
    fn deleted_at(&self) -> Option<i64>;

    /// Returns whether the record is soft-deleted.
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Scope over deleted rows only.
pub fn only_deleted<M: Model>() -> Scope<M> {
    Scope::all().only_deleted()
}

/// Scope over active and deleted rows.
pub fn with_deleted<M: Model>() -> Scope<M> {
    Scope::all().with_deleted()
}

/// Scope over active rows, independent of the installed default filter.
pub fn without_deleted<M: Model>() -> Scope<M> {
    Scope::all().without_deleted()
}

/// Returns the current wall-clock time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
