//! Composable query scope for record listing.
//!
//! # Responsibility
//! - Accumulate predicates and paging for one query expression.
//! - Carry the default-filter flag explicitly into SQL generation.
//!
//! # Invariants
//! - Builder methods consume and return a scope; nothing is shared.
//! - At most one deletion predicate is present at a time.
//! - The implicit `deleted_at IS NULL` filter is added only when the model
//!   installs it and `default_scoped` is still `true`.

use crate::model::record::{Model, RecordId};
use crate::policy::soft_delete::DELETED_AT_COLUMN;
use crate::repo::record_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use std::marker::PhantomData;

/// One filter term of a scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    IdEq(RecordId),
    ColumnEq(&'static str, Value),
    DeletedAtIsNull,
    DeletedAtIsNotNull,
}

impl Predicate {
    fn is_deletion_filter(&self) -> bool {
        matches!(self, Self::DeletedAtIsNull | Self::DeletedAtIsNotNull)
    }
}

/// Deferred query against the table of `M`.
#[derive(Debug, Clone)]
pub struct Scope<M> {
    default_scoped: bool,
    predicates: Vec<Predicate>,
    limit: Option<u32>,
    offset: u32,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Default for Scope<M> {
    fn default() -> Self {
        Self::all()
    }
}

impl<M: Model> Scope<M> {
    /// Ordinary scope: the model's default filter still applies.
    pub fn all() -> Self {
        Self {
            default_scoped: true,
            predicates: Vec::new(),
            limit: None,
            offset: 0,
            _model: PhantomData,
        }
    }

    /// Drops the implicit default filter, keeping explicit predicates.
    pub fn unscoped(mut self) -> Self {
        self.default_scoped = false;
        self
    }

    /// Only soft-deleted rows.
    pub fn only_deleted(self) -> Self {
        self.replace_deletion_filter(Some(Predicate::DeletedAtIsNotNull))
    }

    /// Active and soft-deleted rows.
    pub fn with_deleted(self) -> Self {
        self.replace_deletion_filter(None)
    }

    /// Only active rows, stated explicitly.
    pub fn without_deleted(self) -> Self {
        self.replace_deletion_filter(Some(Predicate::DeletedAtIsNull))
    }

    /// Adds an equality filter on a model-owned column.
    pub fn where_eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::ColumnEq(column, value.into()));
        self
    }

    pub fn where_id(mut self, id: RecordId) -> Self {
        self.predicates.push(Predicate::IdEq(id));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn is_default_scoped(&self) -> bool {
        self.default_scoped
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    fn replace_deletion_filter(mut self, filter: Option<Predicate>) -> Self {
        self.default_scoped = false;
        self.predicates.retain(|predicate| !predicate.is_deletion_filter());
        self.predicates.extend(filter);
        self
    }

    /// Renders `SELECT {projection} ... ORDER BY rowid` with paging.
    pub(crate) fn select_sql(&self, projection: &str) -> RepoResult<(String, Vec<Value>)> {
        let (mut sql, mut bind_values) = self.filtered_sql(projection)?;

        sql.push_str(&format!(" ORDER BY {}.rowid ASC", M::TABLE));

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if self.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(self.offset)));
            }
        } else if self.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(self.offset)));
        }

        Ok((sql, bind_values))
    }

    /// Renders `SELECT COUNT(*)`; paging is ignored.
    pub(crate) fn count_sql(&self) -> RepoResult<(String, Vec<Value>)> {
        self.filtered_sql("COUNT(*)")
    }

    fn filtered_sql(&self, projection: &str) -> RepoResult<(String, Vec<Value>)> {
        let table = M::TABLE;
        let mut sql = format!("SELECT {projection} FROM {table} WHERE 1 = 1");
        let mut bind_values = Vec::new();

        if self.default_scoped && M::default_scope_hides_deleted() {
            sql.push_str(&format!(" AND {table}.{DELETED_AT_COLUMN} IS NULL"));
        }

        for predicate in &self.predicates {
            match predicate {
                Predicate::IdEq(id) => {
                    sql.push_str(&format!(" AND {table}.uuid = ?"));
                    bind_values.push(Value::Text(id.to_string()));
                }
                Predicate::ColumnEq(column, value) => {
                    if !M::COLUMNS.contains(column) {
                        return Err(RepoError::UnknownColumn {
                            table,
                            column: (*column).to_string(),
                        });
                    }
                    sql.push_str(&format!(" AND {table}.{column} = ?"));
                    bind_values.push(value.clone());
                }
                Predicate::DeletedAtIsNull => {
                    ensure_soft_delete_enabled::<M>()?;
                    sql.push_str(&format!(" AND {table}.{DELETED_AT_COLUMN} IS NULL"));
                }
                Predicate::DeletedAtIsNotNull => {
                    ensure_soft_delete_enabled::<M>()?;
                    sql.push_str(&format!(" AND {table}.{DELETED_AT_COLUMN} IS NOT NULL"));
                }
            }
        }

        Ok((sql, bind_values))
    }
}

/// Rejects soft-delete operations on models without the policy.
pub(crate) fn ensure_soft_delete_enabled<M: Model>() -> RepoResult<()> {
    if M::is_paranoid() {
        Ok(())
    } else {
        Err(RepoError::SoftDeleteDisabled(M::TABLE))
    }
}

#[cfg(test)]
mod tests {
    use super::{Predicate, Scope};
    use crate::model::draft::Draft;
    use crate::model::note::Note;
    use crate::model::tag::Tag;
    use crate::repo::record_repo::RepoError;

    fn sql_of<M: crate::model::record::Model>(scope: &Scope<M>) -> String {
        scope.select_sql("uuid").unwrap().0
    }

    #[test]
    fn default_scope_hides_deleted_when_installed() {
        let sql = sql_of(&Scope::<Note>::all());
        assert!(sql.contains("notes.deleted_at IS NULL"), "{sql}");
    }

    #[test]
    fn default_scope_is_absent_when_disabled_at_installation() {
        let sql = sql_of(&Scope::<Draft>::all());
        assert!(!sql.contains("deleted_at"), "{sql}");
    }

    #[test]
    fn only_deleted_disables_default_filter() {
        let scope = Scope::<Note>::all().only_deleted();
        assert!(!scope.is_default_scoped());

        let sql = sql_of(&scope);
        assert!(sql.contains("notes.deleted_at IS NOT NULL"), "{sql}");
        assert!(!sql.contains("deleted_at IS NULL"), "{sql}");
    }

    #[test]
    fn with_deleted_has_no_deletion_predicate() {
        let sql = sql_of(&Scope::<Note>::all().with_deleted());
        assert!(!sql.contains("deleted_at"), "{sql}");
    }

    #[test]
    fn helpers_replace_each_other() {
        let scope = Scope::<Note>::all()
            .only_deleted()
            .without_deleted()
            .only_deleted();
        let deletion_filters = scope
            .predicates()
            .iter()
            .filter(|predicate| {
                matches!(
                    predicate,
                    Predicate::DeletedAtIsNull | Predicate::DeletedAtIsNotNull
                )
            })
            .count();
        assert_eq!(deletion_filters, 1);
        assert_eq!(
            scope.predicates().last(),
            Some(&Predicate::DeletedAtIsNotNull)
        );
    }

    #[test]
    fn helpers_keep_column_filters() {
        let scope = Scope::<Note>::all()
            .where_eq("title", "kept".to_string())
            .with_deleted();
        assert_eq!(scope.predicates().len(), 1);

        let (sql, binds) = scope.select_sql("uuid").unwrap();
        assert!(sql.contains("notes.title = ?"), "{sql}");
        assert_eq!(binds.len(), 1);
    }

    #[test]
    fn paging_binds_limit_and_offset() {
        let (sql, binds) = Scope::<Tag>::all()
            .limit(2)
            .offset(3)
            .select_sql("uuid")
            .unwrap();
        assert!(sql.ends_with("LIMIT ? OFFSET ?"), "{sql}");
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn deletion_filter_on_model_without_policy_is_rejected() {
        let err = Scope::<Tag>::all().only_deleted().select_sql("uuid").unwrap_err();
        assert!(matches!(err, RepoError::SoftDeleteDisabled("tags")));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = Scope::<Note>::all()
            .where_eq("missing", 1_i64)
            .count_sql()
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::UnknownColumn { table: "notes", ref column } if column == "missing"
        ));
    }
}
