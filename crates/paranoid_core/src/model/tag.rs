//! Tag model without the soft-delete policy.
//!
//! Tags are physically removed by `delete`/`destroy`; the `tags` table has
//! no `deleted_at` column.

use crate::model::record::{text_value, Model, ValidationError};
use crate::repo::record_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    /// Creates a tag with a trimmed, lowercase name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
        }
    }
}

impl Model for Tag {
    const TABLE: &'static str = "tags";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::BlankField("name"));
        }
        Ok(())
    }

    fn column_values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone())]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            name: row.get("name")?,
        })
    }

    fn assign_column(&mut self, column: &str, value: &Value) -> RepoResult<()> {
        match column {
            "name" => {
                self.name = text_value(Self::TABLE, column, value)?;
                Ok(())
            }
            other => Err(RepoError::UnknownColumn {
                table: Self::TABLE,
                column: other.to_string(),
            }),
        }
    }
}
