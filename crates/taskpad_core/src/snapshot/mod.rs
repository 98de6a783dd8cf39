//! Persistence adapter boundary for the task collection.
//!
//! # Responsibility
//! - Define the narrow durable-storage contract used by the task store.
//! - Provide the production SQLite backend and an in-process test backend.
//! - Own the versioned snapshot payload codec.
//!
//! # Invariants
//! - A snapshot write replaces the entire stored payload; there are no
//!   partial or merge semantics.
//! - A missing payload is a normal first-run result, not an error.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod codec;
pub mod memory;
pub mod sqlite;

pub use memory::MemorySnapshotStore;
pub use sqlite::SqliteSnapshotStore;

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Durable storage contract for the serialized task collection.
///
/// Implementations store one payload under one fixed slot and report
/// success or failure; they never silently discard errors.
pub trait SnapshotStore: Send + Sync {
    /// Overwrites the stored payload.
    fn write(&self, payload: &str) -> SnapshotResult<()>;

    /// Returns the last successfully written payload, or `None` when
    /// nothing has been stored yet.
    fn read(&self) -> SnapshotResult<Option<String>>;
}

/// Failures raised by snapshot backends.
#[derive(Debug)]
pub enum SnapshotError {
    Db(DbError),
    /// Connection handed to the backend was not bootstrapped via `db::open_db`.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Backend cannot serve requests; carries a human-readable reason.
    Unavailable(String),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it via db::open_db"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::Unavailable(reason) => write!(f, "snapshot backend unavailable: {reason}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for SnapshotError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SnapshotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
