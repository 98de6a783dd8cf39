//! SQLite-backed snapshot storage.
//!
//! # Responsibility
//! - Persist the task snapshot payload in a single `snapshots` row.
//! - Keep SQL details inside the snapshot boundary.
//!
//! # Invariants
//! - The connection must be bootstrapped (`db::open_db`) before use;
//!   `try_new` rejects unmigrated connections instead of masking them.
//! - Reads and writes are serialized through an internal mutex so the
//!   background writer thread can share the connection.

use super::{SnapshotError, SnapshotResult, SnapshotStore};
use crate::db::migrations::{current_user_version, latest_version};
use crate::model::task::now_epoch_ms;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

/// Fixed slot name for the task collection payload.
const TASKS_SLOT: &str = "tasks";

/// Production snapshot backend over a bootstrapped SQLite connection.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    /// Wraps a bootstrapped connection, verifying schema state first.
    ///
    /// # Errors
    /// - `SnapshotError::UninitializedConnection` when migrations have not
    ///   been applied to this connection's database.
    /// - `SnapshotError::MissingRequiredTable` when the schema version
    ///   matches but the `snapshots` table is absent.
    pub fn try_new(conn: Connection) -> SnapshotResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(&conn)?;
        if actual_version != expected_version {
            return Err(SnapshotError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let table_exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'snapshots'
            );",
            [],
            |row| row.get(0),
        )?;
        if table_exists == 0 {
            return Err(SnapshotError::MissingRequiredTable("snapshots"));
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("snapshot connection lock poisoned")
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn write(&self, payload: &str) -> SnapshotResult<()> {
        self.lock().execute(
            "INSERT INTO snapshots (slot, payload, written_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET
                payload = excluded.payload,
                written_at = excluded.written_at;",
            params![TASKS_SLOT, payload, now_epoch_ms()],
        )?;
        Ok(())
    }

    fn read(&self) -> SnapshotResult<Option<String>> {
        let payload = self
            .lock()
            .query_row(
                "SELECT payload FROM snapshots WHERE slot = ?1;",
                [TASKS_SLOT],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }
}
