//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `paranoid_core` linkage and storage bootstrap end to end.
//! - Walk one note through soft delete and restore with deterministic output.
//!
//! Usage: `paranoid_cli [db-path]` (in-memory database when omitted).
//! Logs go to `<tmp>/paranoid-logs` unless `PARANOID_LOG_DIR` is set.

use paranoid_core::db::{open_db, open_db_in_memory};
use paranoid_core::{
    core_version, default_log_level, init_logging, Note, RecordService, RepoError, Scope,
    SqliteRecordRepository,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "PARANOID_LOG_DIR";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RepoError> {
    println!("paranoid_core version={}", core_version());

    let log_dir = log_dir();
    if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        eprintln!("warning: logging disabled: {err}");
    }

    let conn: Connection = match std::env::args().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let service = RecordService::new(SqliteRecordRepository::<Note>::try_new(&conn)?);

    let mut kept = service.create(Note::new("kept", "stays active"))?;
    let mut removed = service.create(Note::new("removed", "soft-deleted below"))?;
    service.destroy(&mut removed)?;
    print_counts(&service, "after destroy")?;

    service.restore(&mut removed)?;
    print_counts(&service, "after restore")?;

    service.soft_delete(&mut kept)?;
    service.soft_delete(&mut removed)?;
    print_counts(&service, "after soft delete")?;

    Ok(())
}

fn log_dir() -> PathBuf {
    match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir().join("paranoid-logs"),
    }
}

fn print_counts(
    service: &RecordService<Note, SqliteRecordRepository<'_, Note>>,
    stage: &str,
) -> Result<(), RepoError> {
    println!(
        "{stage}: default={} with_deleted={} only_deleted={}",
        service.count(&Scope::all())?,
        service.count(&Scope::all().with_deleted())?,
        service.count(&Scope::all().only_deleted())?
    );
    Ok(())
}
