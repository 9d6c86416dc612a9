//! Model contract and in-memory record handle.
//!
//! # Responsibility
//! - Define what a persistable model exposes to the repository layer.
//! - Track per-handle lifecycle state (new, destroyed, frozen, tombstone).
//!
//! # Invariants
//! - `id` is stable and never reused for another record.
//! - A frozen handle rejects attribute writes until it is restored.
//! - `deleted_at` is the source of truth for soft-delete state.

use crate::policy::soft_delete::{SoftDeletable, SoftDeleteOptions};
use crate::repo::record_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of every stored record.
pub type RecordId = Uuid;

/// Model-level validation failures raised by full writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `Record::with_id` received the nil UUID.
    NilUuid,
    /// A required text field is empty after trimming.
    BlankField(&'static str),
    /// A text field exceeds its maximum length in chars.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "record id must not be nil"),
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::TooLong { field, max, actual } => {
                write!(f, "{field} is too long ({actual} > {max} chars)")
            }
        }
    }
}

impl Error for ValidationError {}

/// Contract between a domain model and the SQLite record repository.
///
/// `COLUMNS` lists the model-owned columns in the same order as
/// `column_values`. `uuid` and `deleted_at` are managed by the repository.
pub trait Model: Clone + Sized {
    /// Backing table name.
    const TABLE: &'static str;
    /// Model-owned column names.
    const COLUMNS: &'static [&'static str];
    /// Soft-delete installation; `None` keeps physical deletes.
    const SOFT_DELETE: Option<SoftDeleteOptions> = None;

    /// Whether the soft-delete policy is installed on this model.
    fn is_paranoid() -> bool {
        Self::SOFT_DELETE.is_some()
    }

    /// Whether ordinary queries implicitly hide soft-deleted rows.
    fn default_scope_hides_deleted() -> bool {
        matches!(Self::SOFT_DELETE, Some(options) if !options.disable_default_scope)
    }

    /// Checks model invariants before full writes.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Values bound for `COLUMNS`, in order.
    fn column_values(&self) -> Vec<Value>;

    /// Builds the model from a row selected with `COLUMNS`.
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;

    /// Applies one column value written through an attribute-only update.
    fn assign_column(&mut self, column: &str, value: &Value) -> RepoResult<()>;
}

/// In-memory handle for one stored (or not yet stored) record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = "M: Model + Serialize"))]
pub struct Record<M> {
    id: RecordId,
    #[serde(flatten)]
    attrs: M,
    #[serde(skip_serializing_if = "skip_tombstone::<M>")]
    deleted_at: Option<i64>,
    #[serde(skip)]
    new_record: bool,
    #[serde(skip)]
    destroyed: bool,
    #[serde(skip)]
    frozen: bool,
}

impl<M: Model> Record<M> {
    /// Wraps new attributes with a generated stable ID.
    pub fn new(attrs: M) -> Self {
        Self::build(Uuid::new_v4(), attrs)
    }

    /// Wraps new attributes with a caller-provided stable ID.
    ///
    /// # Errors
    /// - Returns `ValidationError::NilUuid` for the nil UUID.
    pub fn with_id(id: RecordId, attrs: M) -> Result<Self, ValidationError> {
        if id.is_nil() {
            return Err(ValidationError::NilUuid);
        }
        Ok(Self::build(id, attrs))
    }

    pub(crate) fn from_storage(id: RecordId, attrs: M, deleted_at: Option<i64>) -> Self {
        Self {
            id,
            attrs,
            deleted_at,
            new_record: false,
            destroyed: false,
            frozen: false,
        }
    }

    fn build(id: RecordId, attrs: M) -> Self {
        Self {
            id,
            attrs,
            deleted_at: None,
            new_record: true,
            destroyed: false,
            frozen: false,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn attrs(&self) -> &M {
        &self.attrs
    }

    /// Mutable access to model attributes.
    ///
    /// # Errors
    /// - Returns `RepoError::FrozenRecord` once the handle is frozen.
    pub fn attrs_mut(&mut self) -> RepoResult<&mut M> {
        self.ensure_writable()?;
        Ok(&mut self.attrs)
    }

    pub fn into_attrs(self) -> M {
        self.attrs
    }

    /// Soft-delete tombstone in epoch milliseconds.
    pub fn deleted_at(&self) -> Option<i64> {
        self.deleted_at
    }

    /// Always `false` for models without the policy.
    pub fn is_deleted(&self) -> bool {
        M::is_paranoid() && self.deleted_at.is_some()
    }

    /// Type-level capability, exposed on the instance.
    pub fn is_paranoid(&self) -> bool {
        M::is_paranoid()
    }

    /// Returns `true` until the record has been inserted.
    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Deleted-state check.
    ///
    /// With the policy installed this is an alias of `is_deleted`. Without it,
    /// it reports whether the row was physically removed.
    pub fn is_destroyed(&self) -> bool {
        if M::is_paranoid() {
            self.is_deleted()
        } else {
            self.destroyed
        }
    }

    /// Whether a backing row exists for this handle.
    ///
    /// Soft-deleted rows still exist, so policy models only look at
    /// `new_record`.
    pub fn is_persisted(&self) -> bool {
        if M::is_paranoid() {
            !self.new_record
        } else {
            !self.new_record && !self.destroyed
        }
    }

    /// Freezes the handle. Freezing twice is a no-op.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub(crate) fn thaw(&mut self) {
        self.frozen = false;
    }

    pub(crate) fn mark_inserted(&mut self) {
        self.new_record = false;
    }

    pub(crate) fn mark_row_removed(&mut self) {
        self.destroyed = true;
        self.frozen = true;
    }

    pub(crate) fn assign_attr(&mut self, column: &str, value: &Value) -> RepoResult<()> {
        self.attrs.assign_column(column, value)
    }

    pub(crate) fn ensure_writable(&self) -> RepoResult<()> {
        if self.frozen {
            return Err(RepoError::FrozenRecord(self.id));
        }
        Ok(())
    }
}

impl<M: Model> SoftDeletable for Record<M> {
    fn mark_deleted(&mut self, now_epoch_ms: i64) {
        if M::is_paranoid() {
            self.deleted_at = Some(now_epoch_ms);
        }
    }

    fn mark_restored(&mut self) {
        self.deleted_at = None;
    }

    fn deleted_at(&self) -> Option<i64> {
        self.deleted_at
    }
}

// Tables without the policy have no tombstone column to mirror.
fn skip_tombstone<M: Model>(_: &Option<i64>) -> bool {
    !M::is_paranoid()
}

/// Reads a `TEXT` value written through an attribute-only update.
pub(crate) fn text_value(table: &'static str, column: &str, value: &Value) -> RepoResult<String> {
    match value {
        Value::Text(text) => Ok(text.clone()),
        other => Err(RepoError::InvalidData(format!(
            "expected text for {table}.{column}, got {:?}",
            other.data_type()
        ))),
    }
}
