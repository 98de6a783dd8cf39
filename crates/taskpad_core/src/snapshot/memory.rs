//! In-process snapshot storage.
//!
//! # Responsibility
//! - Back the task store without touching disk, for tests and previews.
//! - Allow injecting write failures to exercise degraded-durability paths.

use super::{SnapshotError, SnapshotResult, SnapshotStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Snapshot backend holding the payload in memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl MemorySnapshotStore {
    /// Creates an empty backend (first-run state).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-seeded with a stored payload.
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(payload.into())),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Returns a copy of the currently stored payload, if any.
    pub fn stored_payload(&self) -> Option<String> {
        self.slot.lock().expect("snapshot slot lock poisoned").clone()
    }

    /// Makes subsequent writes fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn write(&self, payload: &str) -> SnapshotResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SnapshotError::Unavailable(
                "write failure injected".to_string(),
            ));
        }
        *self.slot.lock().expect("snapshot slot lock poisoned") = Some(payload.to_string());
        Ok(())
    }

    fn read(&self) -> SnapshotResult<Option<String>> {
        Ok(self.stored_payload())
    }
}
