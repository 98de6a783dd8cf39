//! Core domain logic for Taskpad.
//! This crate is the single source of truth for task-list invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod snapshot;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Filter, Task, TaskCounts, TaskId, TaskPatch, TaskValidationError};
pub use snapshot::codec::{
    decode_snapshot, encode_snapshot, DecodeError, DecodedSnapshot, SNAPSHOT_FORMAT_VERSION,
};
pub use snapshot::{
    MemorySnapshotStore, SnapshotError, SnapshotResult, SnapshotStore, SqliteSnapshotStore,
};
pub use store::{StoreError, StoreResult, TaskStore};

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
