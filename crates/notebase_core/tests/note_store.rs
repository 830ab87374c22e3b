use notebase_core::db::migrations::latest_version;
use notebase_core::db::{open_db, open_db_in_memory};
use notebase_core::{ImportOutcome, NoteContent, NoteStore, SqliteNoteStore, StoreError};
use rusqlite::Connection;
use std::collections::BTreeMap;

fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(key, text)| (key.to_string(), text.to_string()))
        .collect()
}

#[test]
fn import_then_fetch_returns_all_notes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();

    let outcome = store
        .import_files(&files(&[("vault/a.md", "alpha"), ("vault/b.md", "beta")]))
        .unwrap();
    assert_eq!(outcome, ImportOutcome::Success { imported: 2 });

    let corpus = store.fetch_corpus().unwrap();
    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.get("vault/a.md").and_then(NoteContent::as_text), Some("alpha"));
}

#[test]
fn import_upserts_and_keeps_other_notes() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();

    store
        .import_files(&files(&[("a.md", "one"), ("b.md", "two")]))
        .unwrap();
    store.import_files(&files(&[("a.md", "uno")])).unwrap();

    let corpus = store.fetch_corpus().unwrap();
    assert_eq!(corpus.get("a.md").and_then(NoteContent::as_text), Some("uno"));
    assert_eq!(corpus.get("b.md").and_then(NoteContent::as_text), Some("two"));

    let batch = store.last_import().unwrap().expect("batch should be recorded");
    assert_eq!(batch.note_count, 1);
}

#[test]
fn invalid_import_payload_is_a_failure_outcome() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();

    let empty = store.import_files(&BTreeMap::new()).unwrap();
    assert!(matches!(empty, ImportOutcome::Failure { .. }));

    let blank_key = store.import_files(&files(&[("  ", "x"), ("ok.md", "y")])).unwrap();
    assert_eq!(blank_key.status(), "failure");

    assert!(store.fetch_corpus().unwrap().is_empty());
    assert!(store.last_import().unwrap().is_none());
}

#[test]
fn non_text_rows_come_back_as_malformed() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO notes (key, content) VALUES ('text.md', 'hello');
         INSERT INTO notes (key, content) VALUES ('number.md', 42);
         INSERT INTO notes (key, content) VALUES ('blob.bin', X'DEADBEEF');
         INSERT INTO notes (key, content) VALUES ('null.md', NULL);",
    )
    .unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();

    let corpus = store.fetch_corpus().unwrap();
    assert_eq!(corpus.len(), 4);
    assert_eq!(corpus.get("number.md"), Some(&NoteContent::Malformed { kind: "integer" }));
    assert_eq!(corpus.get("blob.bin"), Some(&NoteContent::Malformed { kind: "blob" }));
    assert_eq!(corpus.get("null.md"), Some(&NoteContent::Malformed { kind: "null" }));
    assert_eq!(corpus.malformed_count(), 3);
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteNoteStore::try_new(&conn).err().expect("store must reject raw connection");
    assert!(matches!(
        err,
        StoreError::UninitializedConnection { expected_version, actual_version: 0 }
            if expected_version == latest_version()
    ));
}

#[test]
fn file_database_persists_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteNoteStore::try_new(&conn).unwrap();
        store.import_files(&files(&[("kept.md", "persisted")])).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = SqliteNoteStore::try_new(&conn).unwrap();
    let corpus = store.fetch_corpus().unwrap();
    assert_eq!(corpus.get("kept.md").and_then(NoteContent::as_text), Some("persisted"));
}
