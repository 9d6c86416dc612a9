//! Draft model: soft-delete policy without the default filter.
//!
//! Ordinary draft queries return deleted rows too; callers partition them
//! explicitly with `only_deleted` / `without_deleted`.

use crate::model::record::{text_value, Model, ValidationError};
use crate::policy::soft_delete::{enable_soft_delete, SoftDeleteOptions};
use crate::repo::record_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
}

impl Draft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Model for Draft {
    const TABLE: &'static str = "drafts";
    const COLUMNS: &'static [&'static str] = &["title"];
    const SOFT_DELETE: Option<SoftDeleteOptions> =
        enable_soft_delete(SoftDeleteOptions::without_default_scope());

    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankField("title"));
        }
        Ok(())
    }

    fn column_values(&self) -> Vec<Value> {
        vec![Value::Text(self.title.clone())]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            title: row.get("title")?,
        })
    }

    fn assign_column(&mut self, column: &str, value: &Value) -> RepoResult<()> {
        if column != "title" {
            return Err(RepoError::UnknownColumn {
                table: Self::TABLE,
                column: column.to_string(),
            });
        }
        self.title = text_value(Self::TABLE, column, value)?;
        Ok(())
    }
}
