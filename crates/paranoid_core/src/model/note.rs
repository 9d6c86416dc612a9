//! Note model: soft-delete policy with the default filter enabled.

use crate::model::record::{text_value, Model, ValidationError};
use crate::policy::soft_delete::{enable_soft_delete, SoftDeleteOptions};
use crate::repo::record_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

const TITLE_MAX_CHARS: usize = 200;

/// Titled markdown note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub body: String,
}

impl Note {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

impl Model for Note {
    const TABLE: &'static str = "notes";
    const COLUMNS: &'static [&'static str] = &["title", "body"];
    const SOFT_DELETE: Option<SoftDeleteOptions> = enable_soft_delete(SoftDeleteOptions::new());

    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankField("title"));
        }
        let actual = self.title.chars().count();
        if actual > TITLE_MAX_CHARS {
            return Err(ValidationError::TooLong {
                field: "title",
                max: TITLE_MAX_CHARS,
                actual,
            });
        }
        Ok(())
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Text(self.body.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            title: row.get("title")?,
            body: row.get("body")?,
        })
    }

    fn assign_column(&mut self, column: &str, value: &Value) -> RepoResult<()> {
        match column {
            "title" => self.title = text_value(Self::TABLE, column, value)?,
            "body" => self.body = text_value(Self::TABLE, column, value)?,
            other => {
                return Err(RepoError::UnknownColumn {
                    table: Self::TABLE,
                    column: other.to_string(),
                })
            }
        }
        Ok(())
    }
}
