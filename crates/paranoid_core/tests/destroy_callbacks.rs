use paranoid_core::db::open_db_in_memory;
use paranoid_core::{
    Callbacks, Note, RecordService, RepoError, Scope, SqliteRecordRepository, Tag,
};
use std::cell::RefCell;
use std::rc::Rc;

type Journal = Rc<RefCell<Vec<String>>>;

fn journaling_callbacks<M: paranoid_core::Model>(journal: &Journal) -> Callbacks<M> {
    let before = Rc::clone(journal);
    let after = Rc::clone(journal);
    let mut callbacks = Callbacks::new();
    callbacks
        .before_destroy(move |record| {
            before
                .borrow_mut()
                .push(format!("before deleted={}", record.is_deleted()));
            Ok(())
        })
        .after_destroy(move |record| {
            after
                .borrow_mut()
                .push(format!("after deleted={}", record.is_deleted()));
            Ok(())
        });
    callbacks
}

#[test]
fn destroy_runs_hooks_around_soft_delete() {
    let conn = open_db_in_memory().unwrap();
    let journal: Journal = Rc::default();
    let repo = SqliteRecordRepository::<Note>::try_new(&conn)
        .unwrap()
        .with_callbacks(journaling_callbacks(&journal));
    let service = RecordService::new(repo);

    let mut note = service.create(Note::new("hooked", "")).unwrap();
    service.destroy(&mut note).unwrap();

    assert_eq!(
        *journal.borrow(),
        vec!["before deleted=false".to_string(), "after deleted=true".to_string()]
    );
    assert!(note.is_deleted());
    assert_eq!(service.count(&Scope::all().with_deleted()).unwrap(), 1);
}

#[test]
fn delete_skips_hooks() {
    let conn = open_db_in_memory().unwrap();
    let journal: Journal = Rc::default();
    let repo = SqliteRecordRepository::<Note>::try_new(&conn)
        .unwrap()
        .with_callbacks(journaling_callbacks(&journal));
    let service = RecordService::new(repo);

    let mut note = service.create(Note::new("quiet", "")).unwrap();
    service.delete(&mut note).unwrap();

    assert!(journal.borrow().is_empty());
    assert!(note.is_deleted());
}

#[test]
fn failing_before_hook_halts_destroy() {
    let conn = open_db_in_memory().unwrap();
    let mut repo = SqliteRecordRepository::<Note>::try_new(&conn).unwrap();
    repo.callbacks_mut()
        .before_destroy(|_| Err("record is locked".to_string()));
    let service = RecordService::new(repo);

    let mut note = service.create(Note::new("locked", "")).unwrap();
    let err = service.destroy(&mut note).unwrap_err();

    match err {
        RepoError::CallbackHalted { table, reason } => {
            assert_eq!(table, "notes");
            assert_eq!(reason, "record is locked");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!note.is_deleted());
    assert!(!note.is_frozen());
    assert_eq!(service.all().unwrap().len(), 1);
}

#[test]
fn destroy_permanently_runs_hooks_and_removes_row() {
    let conn = open_db_in_memory().unwrap();
    let journal: Journal = Rc::default();
    let repo = SqliteRecordRepository::<Note>::try_new(&conn)
        .unwrap()
        .with_callbacks(journaling_callbacks(&journal));
    let service = RecordService::new(repo);

    let mut note = service.create(Note::new("gone", "")).unwrap();
    service.destroy_permanently(&mut note).unwrap();

    assert_eq!(journal.borrow().len(), 2);
    assert_eq!(service.count(&Scope::all().with_deleted()).unwrap(), 0);
}

#[test]
fn destroy_on_model_without_policy_removes_row() {
    let conn = open_db_in_memory().unwrap();
    let journal: Journal = Rc::default();
    let repo = SqliteRecordRepository::<Tag>::try_new(&conn)
        .unwrap()
        .with_callbacks(journaling_callbacks(&journal));
    let service = RecordService::new(repo);

    let mut tag = service.create(Tag::new("temp")).unwrap();
    service.destroy(&mut tag).unwrap();

    assert_eq!(journal.borrow().len(), 2);
    assert!(tag.is_destroyed());
    assert!(service.all().unwrap().is_empty());
}
