//! Record lifecycle service with soft-delete semantics.
//!
//! # Responsibility
//! - Route `delete`/`destroy` to tombstoning for models with the policy and
//!   to physical removal for the rest.
//! - Keep physical removal reachable via `hard_delete` and
//!   `destroy_permanently`.
//! - Expose default / only / with / without deleted listings.
//!
//! # Invariants
//! - `soft_delete` writes `deleted_at` only for persisted, active records and
//!   always leaves the handle frozen.
//! - `restore` always issues the write and un-freezes the handle on success.
//! - Tombstone writes use the attribute-only update path.
//! - Logs carry ids and table names only, never record content.

use crate::model::record::{Model, Record, RecordId};
use crate::policy::soft_delete::{now_epoch_ms, DELETED_AT_COLUMN};
use crate::repo::record_repo::{RecordRepository, RepoResult};
use crate::repo::scope::{ensure_soft_delete_enabled, Scope};
use log::{debug, info};
use rusqlite::types::Value;
use std::marker::PhantomData;

/// Use-case service for one model's record lifecycle.
pub struct RecordService<M: Model, R: RecordRepository<M>> {
    repo: R,
    clock: fn() -> i64,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model, R: RecordRepository<M>> RecordService<M, R> {
    /// Creates a service using the system clock for tombstones.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            clock: now_epoch_ms,
            _model: PhantomData,
        }
    }

    /// Replaces the tombstone clock (epoch milliseconds).
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Inserts new attributes and returns the persisted handle.
    pub fn create(&self, attrs: M) -> RepoResult<Record<M>> {
        let mut record = Record::new(attrs);
        self.repo.insert(&mut record)?;
        Ok(record)
    }

    /// Validating full write.
    pub fn save(&self, record: &mut Record<M>) -> RepoResult<()> {
        self.repo.save(record)
    }

    /// Finds a record through the model's default scope.
    pub fn find(&self, id: RecordId) -> RepoResult<Option<Record<M>>> {
        self.repo.find(id, &Scope::all())
    }

    /// Finds a record regardless of its deleted state.
    pub fn find_with_deleted(&self, id: RecordId) -> RepoResult<Option<Record<M>>> {
        self.repo.find(id, &Scope::all().with_deleted())
    }

    /// Lists through the model's default scope.
    pub fn all(&self) -> RepoResult<Vec<Record<M>>> {
        self.repo.load(&Scope::all())
    }

    pub fn only_deleted(&self) -> RepoResult<Vec<Record<M>>> {
        self.repo.load(&Scope::all().only_deleted())
    }

    pub fn with_deleted(&self) -> RepoResult<Vec<Record<M>>> {
        self.repo.load(&Scope::all().with_deleted())
    }

    pub fn without_deleted(&self) -> RepoResult<Vec<Record<M>>> {
        self.repo.load(&Scope::all().without_deleted())
    }

    /// Lists an arbitrary scope.
    pub fn load(&self, scope: &Scope<M>) -> RepoResult<Vec<Record<M>>> {
        self.repo.load(scope)
    }

    pub fn count(&self, scope: &Scope<M>) -> RepoResult<u64> {
        self.repo.count(scope)
    }

    /// Tombstones a record.
    ///
    /// Writes `deleted_at = now` when the record is persisted and not yet
    /// deleted, then freezes the handle. Repeated calls keep the first
    /// timestamp and do not fail.
    ///
    /// # Errors
    /// - `SoftDeleteDisabled` for models without the policy.
    /// - Update failures propagate unchanged; the handle is not frozen then.
    pub fn soft_delete(&self, record: &mut Record<M>) -> RepoResult<()> {
        ensure_soft_delete_enabled::<M>()?;

        if !record.is_deleted() && record.is_persisted() {
            let now = (self.clock)();
            self.repo
                .update_column(record, DELETED_AT_COLUMN, Value::Integer(now))?;
            info!(
                "event=soft_delete module=service status=ok table={} id={}",
                M::TABLE,
                record.id()
            );
        } else {
            debug!(
                "event=soft_delete module=service status=skipped table={} id={} deleted={} persisted={}",
                M::TABLE,
                record.id(),
                record.is_deleted(),
                record.is_persisted()
            );
        }

        record.freeze();
        Ok(())
    }

    /// Physically removes the backing row.
    pub fn hard_delete(&self, record: &mut Record<M>) -> RepoResult<()> {
        self.repo.delete_row(record)?;
        info!(
            "event=hard_delete module=service status=ok table={} id={}",
            M::TABLE,
            record.id()
        );
        Ok(())
    }

    /// Model-appropriate delete without callbacks.
    pub fn delete(&self, record: &mut Record<M>) -> RepoResult<()> {
        if M::is_paranoid() {
            self.soft_delete(record)
        } else {
            self.hard_delete(record)
        }
    }

    /// Model-appropriate delete wrapped in destroy hooks.
    pub fn destroy(&self, record: &mut Record<M>) -> RepoResult<()> {
        self.repo
            .run_destroy_callbacks(record, |record| self.delete(record))
    }

    /// Physical removal wrapped in destroy hooks.
    pub fn destroy_permanently(&self, record: &mut Record<M>) -> RepoResult<()> {
        self.repo
            .run_destroy_callbacks(record, |record| self.hard_delete(record))
    }

    /// Clears the tombstone of a record.
    ///
    /// The write is issued unconditionally, also for active records. A handle
    /// frozen by an earlier delete becomes writable again once the write
    /// succeeds.
    ///
    /// # Errors
    /// - `SoftDeleteDisabled` for models without the policy.
    /// - `NotPersisted` for never-saved records.
    /// - `NotFound` when the row was physically removed.
    pub fn restore(&self, record: &mut Record<M>) -> RepoResult<()> {
        ensure_soft_delete_enabled::<M>()?;

        let was_frozen = record.is_frozen();
        record.thaw();
        if let Err(err) = self
            .repo
            .update_column(record, DELETED_AT_COLUMN, Value::Null)
        {
            if was_frozen {
                record.freeze();
            }
            return Err(err);
        }

        info!(
            "event=restore module=service status=ok table={} id={}",
            M::TABLE,
            record.id()
        );
        Ok(())
    }
}
