use rusqlite::Connection;
use sharenote_core::db::migrations::{current_version, latest_version};
use sharenote_core::db::{open_db, open_db_in_memory, DbError};
use sharenote_core::{NewNote, NewUser, SqliteNoteRepository, SqliteUserRepository};
use sharenote_core::{NoteRepository, RepoError, UserRepository};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_version(&conn).unwrap(), latest_version());
    for table in ["users", "notes", "note_tags", "note_shares"] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sharenote.db");

    let conn_first = open_db(&path).unwrap();
    let owner = SqliteUserRepository::try_new(&conn_first)
        .unwrap()
        .insert_user(&NewUser::new("alice", "alice@example.com", "hash"))
        .unwrap();
    let draft = NewNote::new(owner, "kept", "across reopen")
        .into_draft()
        .unwrap();
    let note_id = SqliteNoteRepository::try_new(&conn_first)
        .unwrap()
        .insert_note(&draft)
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(current_version(&conn_second).unwrap(), latest_version());
    let note = SqliteNoteRepository::try_new(&conn_second)
        .unwrap()
        .get_note(note_id)
        .unwrap()
        .unwrap();
    assert_eq!(note.title, "kept");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteNoteRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("users")));
}

#[test]
fn deleting_note_cascades_tags_and_shares() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let owner = users
        .insert_user(&NewUser::new("alice", "alice@example.com", "hash"))
        .unwrap();
    let bob = users
        .insert_user(&NewUser::new("bob", "bob@example.com", "hash"))
        .unwrap();

    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    let draft = NewNote::new(owner, "t", "c")
        .with_tags(["a", "b"])
        .into_draft()
        .unwrap();
    let id = notes.insert_note(&draft).unwrap();
    assert!(notes.replace_shared_with_if_owner(id, owner, &[bob]).unwrap());
    assert!(notes.delete_note_if_owner(id, owner).unwrap());

    assert_eq!(count(&conn, "note_tags"), 0);
    assert_eq!(count(&conn, "note_shares"), 0);
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
