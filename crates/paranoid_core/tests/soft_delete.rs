use paranoid_core::db::open_db_in_memory;
use paranoid_core::{
    Note, Record, RecordRepository, RecordService, RepoError, SqliteRecordRepository, Tag,
};
use rusqlite::Connection;

const DELETED_AT: i64 = 1_700_000_000_000;

fn fixed_clock() -> i64 {
    DELETED_AT
}

fn later_clock() -> i64 {
    DELETED_AT + 60_000
}

fn note_service(conn: &Connection) -> RecordService<Note, SqliteRecordRepository<'_, Note>> {
    RecordService::new(SqliteRecordRepository::try_new(conn).unwrap()).with_clock(fixed_clock)
}

fn stored_deleted_at(conn: &Connection, record: &Record<Note>) -> Option<i64> {
    conn.query_row(
        "SELECT deleted_at FROM notes WHERE uuid = ?1;",
        [record.id().to_string()],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn soft_delete_sets_tombstone_and_keeps_row() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut note = service.create(Note::new("plan", "body")).unwrap();
    assert!(!note.is_deleted());

    service.soft_delete(&mut note).unwrap();

    assert!(note.is_deleted());
    assert!(note.is_destroyed());
    assert_eq!(note.deleted_at(), Some(DELETED_AT));
    assert_eq!(stored_deleted_at(&conn, &note), Some(DELETED_AT));

    let row_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(row_count, 1);
}

#[test]
fn soft_delete_twice_keeps_first_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut note = service.create(Note::new("twice", "")).unwrap();
    service.soft_delete(&mut note).unwrap();
    let first = note.deleted_at();

    let later = RecordService::new(SqliteRecordRepository::<Note>::try_new(&conn).unwrap())
        .with_clock(later_clock);
    later.soft_delete(&mut note).unwrap();

    assert_eq!(note.deleted_at(), first);
    assert_eq!(stored_deleted_at(&conn, &note), first);
    assert!(note.is_frozen());
}

#[test]
fn soft_delete_on_fresh_copy_of_deleted_row_is_noop() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut note = service.create(Note::new("copy", "")).unwrap();
    service.soft_delete(&mut note).unwrap();

    let mut copy = service.find_with_deleted(note.id()).unwrap().unwrap();
    RecordService::new(SqliteRecordRepository::<Note>::try_new(&conn).unwrap())
        .with_clock(later_clock)
        .soft_delete(&mut copy)
        .unwrap();

    assert_eq!(copy.deleted_at(), Some(DELETED_AT));
    assert_eq!(stored_deleted_at(&conn, &note), Some(DELETED_AT));
}

#[test]
fn soft_delete_on_unsaved_record_leaves_tombstone_empty() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut draft = Record::new(Note::new("unsaved", ""));
    service.soft_delete(&mut draft).unwrap();

    assert_eq!(draft.deleted_at(), None);
    assert!(draft.is_frozen());
    assert!(!draft.is_persisted());
}

#[test]
fn soft_delete_freezes_handle() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut note = service.create(Note::new("frozen", "")).unwrap();
    service.delete(&mut note).unwrap();

    let id = note.id();
    assert!(matches!(note.attrs_mut(), Err(RepoError::FrozenRecord(frozen)) if frozen == id));
    let err = service.save(&mut note).unwrap_err();
    assert!(matches!(err, RepoError::FrozenRecord(_)));
}

#[test]
fn soft_delete_bypasses_validation() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut note = service.create(Note::new("valid", "")).unwrap();
    note.attrs_mut().unwrap().title = "   ".to_string();
    assert!(matches!(
        service.save(&mut note).unwrap_err(),
        RepoError::Validation(_)
    ));

    service.soft_delete(&mut note).unwrap();

    let stored = service.find_with_deleted(note.id()).unwrap().unwrap();
    assert_eq!(stored.attrs().title, "valid");
    assert!(stored.is_deleted());
}

#[test]
fn restore_clears_tombstone_and_unfreezes() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut note = service.create(Note::new("back", "")).unwrap();
    service.soft_delete(&mut note).unwrap();
    service.restore(&mut note).unwrap();

    assert!(!note.is_deleted());
    assert!(!note.is_frozen());
    assert_eq!(stored_deleted_at(&conn, &note), None);

    note.attrs_mut().unwrap().body = "edited".to_string();
    service.save(&mut note).unwrap();
    assert_eq!(
        service.find(note.id()).unwrap().unwrap().attrs().body,
        "edited"
    );
}

#[test]
fn restore_on_active_record_still_writes() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut note = service.create(Note::new("active", "")).unwrap();
    service.restore(&mut note).unwrap();
    assert!(!note.is_deleted());

    conn.execute("DELETE FROM notes;", []).unwrap();
    let err = service.restore(&mut note).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == note.id()));
}

#[test]
fn restore_on_unsaved_record_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut note = Record::new(Note::new("unsaved", ""));
    let err = service.restore(&mut note).unwrap_err();
    assert!(matches!(err, RepoError::NotPersisted(_)));
}

#[test]
fn failed_restore_keeps_handle_frozen() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut note = service.create(Note::new("gone", "")).unwrap();
    service.soft_delete(&mut note).unwrap();
    conn.execute("DELETE FROM notes;", []).unwrap();

    assert!(service.restore(&mut note).is_err());
    assert!(note.is_frozen());
    assert!(note.is_deleted());
}

#[test]
fn persisted_check_follows_policy() {
    let conn = open_db_in_memory().unwrap();
    let notes = note_service(&conn);
    let tags = RecordService::new(SqliteRecordRepository::<Tag>::try_new(&conn).unwrap());

    let unsaved = Record::new(Note::new("unsaved", ""));
    assert!(!unsaved.is_persisted());

    let mut note = notes.create(Note::new("saved", "")).unwrap();
    notes.soft_delete(&mut note).unwrap();
    assert!(note.is_persisted());

    let mut tag = tags.create(Tag::new("rust")).unwrap();
    assert!(tag.is_persisted());
    tags.delete(&mut tag).unwrap();
    assert!(!tag.is_persisted());
    assert!(tag.is_destroyed());
    assert!(!tag.is_deleted());
}

#[test]
fn hard_delete_removes_row_for_policy_model() {
    let conn = open_db_in_memory().unwrap();
    let service = note_service(&conn);

    let mut note = service.create(Note::new("purge", "")).unwrap();
    service.soft_delete(&mut note).unwrap();
    service.hard_delete(&mut note).unwrap();

    assert!(service.find_with_deleted(note.id()).unwrap().is_none());
    assert!(note.is_frozen());
    assert!(note.is_persisted());
}

#[test]
fn soft_delete_is_rejected_for_model_without_policy() {
    let conn = open_db_in_memory().unwrap();
    let tags = RecordService::new(SqliteRecordRepository::<Tag>::try_new(&conn).unwrap());

    let mut tag = tags.create(Tag::new("plain")).unwrap();
    assert!(matches!(
        tags.soft_delete(&mut tag).unwrap_err(),
        RepoError::SoftDeleteDisabled("tags")
    ));
    assert!(matches!(
        tags.restore(&mut tag).unwrap_err(),
        RepoError::SoftDeleteDisabled("tags")
    ));
    assert!(!tag.is_frozen());
}

#[test]
fn update_column_writes_single_attribute() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRecordRepository::<Note>::try_new(&conn).unwrap();
    let service = RecordService::new(SqliteRecordRepository::<Note>::try_new(&conn).unwrap());

    let mut note = service.create(Note::new("title", "old")).unwrap();
    repo.update_column(&mut note, "body", "new".to_string().into())
        .unwrap();
    assert_eq!(note.attrs().body, "new");
    assert_eq!(service.find(note.id()).unwrap().unwrap().attrs().body, "new");

    let err = repo
        .update_column(&mut note, "missing", rusqlite::types::Value::Null)
        .unwrap_err();
    assert!(matches!(err, RepoError::UnknownColumn { table: "notes", .. }));
}
