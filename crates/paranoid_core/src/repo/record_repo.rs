//! Record repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/save/find/list primitives over one model table.
//! - Provide the attribute-only update and physical row removal used by the
//!   soft-delete policy.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Full writes (`insert`, `save`) call `Model::validate()` first.
//! - `update_column` skips validation and callbacks, but still rejects
//!   frozen and never-saved handles.
//! - Read paths reject malformed persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::record::{Model, Record, RecordId, ValidationError};
use crate::policy::soft_delete::{SoftDeletable, DELETED_AT_COLUMN};
use crate::repo::callbacks::Callbacks;
use crate::repo::scope::{ensure_soft_delete_enabled, Scope};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const UPDATED_AT_COLUMN: &str = "updated_at";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(RecordId),
    InvalidData(String),
    /// Write attempted through a frozen handle.
    FrozenRecord(RecordId),
    /// Attribute-only update attempted on a never-saved record.
    NotPersisted(RecordId),
    /// Soft-delete operation on a model without the policy.
    SoftDeleteDisabled(&'static str),
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    /// A destroy hook refused to continue.
    CallbackHalted {
        table: &'static str,
        reason: String,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::FrozenRecord(id) => write!(f, "can't modify frozen record {id}"),
            Self::NotPersisted(id) => write!(f, "can't update a new record: {id}"),
            Self::SoftDeleteDisabled(table) => {
                write!(f, "soft delete is not enabled for table `{table}`")
            }
            Self::UnknownColumn { table, column } => {
                write!(f, "unknown column `{column}` for table `{table}`")
            }
            Self::CallbackHalted { table, reason } => {
                write!(f, "destroy halted by callback on `{table}`: {reason}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is older than required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence primitives the soft-delete policy is built on.
pub trait RecordRepository<M: Model> {
    /// Inserts a never-saved record.
    fn insert(&self, record: &mut Record<M>) -> RepoResult<()>;
    /// Validating full write; inserts when the record is new.
    fn save(&self, record: &mut Record<M>) -> RepoResult<()>;
    /// Finds one record by ID within `scope`.
    fn find(&self, id: RecordId, scope: &Scope<M>) -> RepoResult<Option<Record<M>>>;
    /// Loads all records matched by `scope` in insertion order.
    fn load(&self, scope: &Scope<M>) -> RepoResult<Vec<Record<M>>>;
    /// Counts records matched by `scope`, ignoring paging.
    fn count(&self, scope: &Scope<M>) -> RepoResult<u64>;
    /// Writes a single column without validation or callbacks.
    fn update_column(&self, record: &mut Record<M>, column: &str, value: Value)
        -> RepoResult<()>;
    /// Physically removes the backing row and freezes the handle.
    fn delete_row(&self, record: &mut Record<M>) -> RepoResult<()>;
    /// Runs registered destroy hooks around `body`.
    fn run_destroy_callbacks<F>(&self, record: &mut Record<M>, body: F) -> RepoResult<()>
    where
        F: FnOnce(&mut Record<M>) -> RepoResult<()>;
}

/// SQLite-backed repository for one model table.
pub struct SqliteRecordRepository<'conn, M> {
    conn: &'conn Connection,
    callbacks: Callbacks<M>,
}

impl<'conn, M: Model> SqliteRecordRepository<'conn, M> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the model
    ///   table does not match `M` (including `deleted_at` for policy models
    ///   and the `updated_at` stamp written by `save`).
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready::<M>(conn)?;
        Ok(Self {
            conn,
            callbacks: Callbacks::new(),
        })
    }

    pub fn with_callbacks(mut self, callbacks: Callbacks<M>) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn callbacks_mut(&mut self) -> &mut Callbacks<M> {
        &mut self.callbacks
    }

    fn projection() -> String {
        let mut columns = vec!["uuid"];
        if M::is_paranoid() {
            columns.push(DELETED_AT_COLUMN);
        }
        columns.extend_from_slice(M::COLUMNS);
        columns.join(", ")
    }
}

impl<M: Model> RecordRepository<M> for SqliteRecordRepository<'_, M> {
    fn insert(&self, record: &mut Record<M>) -> RepoResult<()> {
        if !record.is_new_record() {
            return Err(RepoError::InvalidData(format!(
                "record {} is already persisted",
                record.id()
            )));
        }
        record.attrs().validate()?;

        let mut columns = vec!["uuid"];
        let mut bind_values = vec![Value::Text(record.id().to_string())];
        if M::is_paranoid() {
            columns.push(DELETED_AT_COLUMN);
            bind_values.push(record.deleted_at().map_or(Value::Null, Value::Integer));
        }
        columns.extend_from_slice(M::COLUMNS);
        bind_values.extend(record.attrs().column_values());

        let placeholders = vec!["?"; columns.len()].join(", ");
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({placeholders});",
                M::TABLE,
                columns.join(", ")
            ),
            params_from_iter(bind_values),
        )?;

        record.mark_inserted();
        debug!(
            "event=record_insert module=repo status=ok table={} id={}",
            M::TABLE,
            record.id()
        );
        Ok(())
    }

    fn save(&self, record: &mut Record<M>) -> RepoResult<()> {
        if record.is_new_record() {
            return self.insert(record);
        }
        record.ensure_writable()?;
        record.attrs().validate()?;

        let assignments = M::COLUMNS
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut bind_values = record.attrs().column_values();
        bind_values.push(Value::Text(record.id().to_string()));

        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET {assignments}, {UPDATED_AT_COLUMN} = (strftime('%s', 'now') * 1000) WHERE uuid = ?;",
                M::TABLE
            ),
            params_from_iter(bind_values),
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(record.id()));
        }
        Ok(())
    }

    fn find(&self, id: RecordId, scope: &Scope<M>) -> RepoResult<Option<Record<M>>> {
        let scope = scope.clone().where_id(id).limit(1);
        Ok(self.load(&scope)?.into_iter().next())
    }

    fn load(&self, scope: &Scope<M>) -> RepoResult<Vec<Record<M>>> {
        let (sql, bind_values) = scope.select_sql(&Self::projection())?;
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row::<M>(row)?);
        }

        Ok(records)
    }

    fn count(&self, scope: &Scope<M>) -> RepoResult<u64> {
        let (sql, bind_values) = scope.count_sql()?;
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
    }

    fn update_column(
        &self,
        record: &mut Record<M>,
        column: &str,
        value: Value,
    ) -> RepoResult<()> {
        if record.is_new_record() {
            return Err(RepoError::NotPersisted(record.id()));
        }
        record.ensure_writable()?;

        let column = if column == DELETED_AT_COLUMN {
            ensure_soft_delete_enabled::<M>()?;
            if !matches!(value, Value::Null | Value::Integer(_)) {
                return Err(RepoError::InvalidData(format!(
                    "{}.{DELETED_AT_COLUMN} must be an integer or null",
                    M::TABLE
                )));
            }
            DELETED_AT_COLUMN
        } else {
            M::COLUMNS
                .iter()
                .copied()
                .find(|known| *known == column)
                .ok_or_else(|| RepoError::UnknownColumn {
                    table: M::TABLE,
                    column: column.to_string(),
                })?
        };

        let changed = self.conn.execute(
            &format!("UPDATE {} SET {column} = ?1 WHERE uuid = ?2;", M::TABLE),
            rusqlite::params![value, record.id().to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(record.id()));
        }

        if column == DELETED_AT_COLUMN {
            match value {
                Value::Integer(at) => record.mark_deleted(at),
                _ => record.mark_restored(),
            }
        } else {
            record.assign_attr(column, &value)?;
        }

        debug!(
            "event=update_column module=repo status=ok table={} column={} id={}",
            M::TABLE,
            column,
            record.id()
        );
        Ok(())
    }

    fn delete_row(&self, record: &mut Record<M>) -> RepoResult<()> {
        if record.is_new_record() {
            return Err(RepoError::NotPersisted(record.id()));
        }

        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE uuid = ?1;", M::TABLE),
            [record.id().to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(record.id()));
        }

        record.mark_row_removed();
        Ok(())
    }

    fn run_destroy_callbacks<F>(&self, record: &mut Record<M>, body: F) -> RepoResult<()>
    where
        F: FnOnce(&mut Record<M>) -> RepoResult<()>,
    {
        self.callbacks.run_destroy(record, body)
    }
}

fn parse_record_row<M: Model>(row: &Row<'_>) -> RepoResult<Record<M>> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in {}.uuid",
            M::TABLE
        ))
    })?;

    let deleted_at = if M::is_paranoid() {
        row.get::<_, Option<i64>>(DELETED_AT_COLUMN)?
    } else {
        None
    };

    Ok(Record::from_storage(id, M::from_row(row)?, deleted_at))
}

fn ensure_connection_ready<M: Model>(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [M::TABLE],
        |row| row.get(0),
    )?;
    if table_exists != 1 {
        return Err(RepoError::MissingRequiredTable(M::TABLE));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", M::TABLE))?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<HashSet<_>, _>>()?;

    let mut required = vec!["uuid"];
    if M::is_paranoid() {
        required.push(DELETED_AT_COLUMN);
    }
    required.extend_from_slice(M::COLUMNS);
    // `save` stamps this column on every full write.
    required.push(UPDATED_AT_COLUMN);

    if let Some(column) = required.into_iter().find(|column| !present.contains(*column)) {
        return Err(RepoError::MissingRequiredColumn {
            table: M::TABLE,
            column,
        });
    }

    Ok(())
}
