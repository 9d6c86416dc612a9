//! Soft-delete record lifecycle over SQLite.
//!
//! Records of models that install the policy are tombstoned through a
//! nullable `deleted_at` column instead of being removed, hidden from default
//! queries, and recoverable with `restore`.

pub mod db;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::draft::Draft;
pub use model::note::Note;
pub use model::record::{Model, Record, RecordId, ValidationError};
pub use model::tag::Tag;
pub use policy::soft_delete::{
    enable_soft_delete, only_deleted, with_deleted, without_deleted, SoftDeletable,
    SoftDeleteOptions, DELETED_AT_COLUMN,
};
pub use repo::callbacks::Callbacks;
pub use repo::record_repo::{RecordRepository, RepoError, RepoResult, SqliteRecordRepository};
pub use repo::scope::{Predicate, Scope};
pub use service::record_service::RecordService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
