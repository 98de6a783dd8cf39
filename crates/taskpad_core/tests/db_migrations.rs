use rusqlite::Connection;
use std::sync::Arc;
use taskpad_core::db::migrations::latest_version;
use taskpad_core::db::{open_db, open_db_in_memory, DbError};
use taskpad_core::{SnapshotError, SnapshotStore, SqliteSnapshotStore, TaskStore};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "snapshots");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskpad.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "snapshots");
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
fn snapshot_store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteSnapshotStore::try_new(conn);
    match result {
        Err(SnapshotError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn snapshot_store_rejects_connection_without_snapshots_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteSnapshotStore::try_new(conn);
    assert!(matches!(
        result,
        Err(SnapshotError::MissingRequiredTable("snapshots"))
    ));
}

#[test]
fn snapshot_slot_round_trips_within_a_connection() {
    let backend = SqliteSnapshotStore::try_new(open_db_in_memory().unwrap()).unwrap();

    assert_eq!(backend.read().unwrap(), None);

    backend.write("first payload").unwrap();
    backend.write("second payload").unwrap();

    assert_eq!(backend.read().unwrap().as_deref(), Some("second payload"));
}

#[test]
fn task_collection_survives_reopening_the_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskpad.db");

    let backend = Arc::new(SqliteSnapshotStore::try_new(open_db(&path).unwrap()).unwrap());
    let mut store = TaskStore::new(backend);
    store.load().unwrap();
    let task = store.create("Buy milk", Some("2%")).unwrap();
    store.flush().unwrap();
    drop(store);

    let reopened = Arc::new(SqliteSnapshotStore::try_new(open_db(&path).unwrap()).unwrap());
    let mut restored = TaskStore::new(reopened);
    restored.load().unwrap();

    assert_eq!(restored.tasks().len(), 1);
    assert_eq!(restored.tasks()[0].id, task.id);
    assert_eq!(restored.tasks()[0].title, "Buy milk");
    assert_eq!(restored.tasks()[0].description.as_deref(), Some("2%"));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
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
