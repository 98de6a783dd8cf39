//! Authoritative task store.
//!
//! # Responsibility
//! - Own the in-memory task collection and every mutation applied to it.
//! - Schedule a full-snapshot persist after each mutation.
//! - Serve derived views (filtering, counts) from current state.
//!
//! # Invariants
//! - Mutations complete in memory before the call returns; persistence is
//!   asynchronous and never gates the next mutation.
//! - Every persisted payload encodes the collection as it was at dispatch
//!   time, so a later write can never revert an earlier mutation.
//! - Insertion order is preserved; creates append.

use crate::model::task::{
    normalize_description, normalize_title, Filter, Task, TaskCounts, TaskId, TaskPatch,
    TaskValidationError,
};
use crate::snapshot::codec::{self, DecodeError, SNAPSHOT_FORMAT_VERSION};
use crate::snapshot::{SnapshotError, SnapshotStore};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

mod writer;

use writer::SnapshotWriter;

pub type StoreResult<T> = Result<T, StoreError>;

/// Caller-facing error for task store operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(TaskValidationError),
    NotFound(TaskId),
    /// Backend failed while reading the stored payload.
    SnapshotRead(SnapshotError),
    /// Stored payload was present but not decodable.
    SnapshotDecode(DecodeError),
    /// Most recent snapshot write failed; in-memory state is unaffected.
    SnapshotWrite(SnapshotError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::SnapshotRead(err) => write!(f, "failed to read stored tasks: {err}"),
            Self::SnapshotDecode(err) => write!(f, "failed to decode stored tasks: {err}"),
            Self::SnapshotWrite(err) => write!(f, "failed to persist tasks: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::SnapshotRead(err) | Self::SnapshotWrite(err) => Some(err),
            Self::SnapshotDecode(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Single source of truth for task records.
///
/// Constructed once at startup with an injected snapshot backend and
/// passed by reference to the view layer; there is no process-wide
/// singleton. Mutations take `&mut self`, which confines them to one
/// logical thread.
pub struct TaskStore {
    tasks: Vec<Task>,
    snapshots: Arc<dyn SnapshotStore>,
    writer: SnapshotWriter,
}

impl TaskStore {
    /// Creates an empty store and spawns its background snapshot writer.
    ///
    /// Call `load()` before serving reads; it is the one synchronization
    /// point between startup and the view layer.
    pub fn new(snapshots: Arc<dyn SnapshotStore>) -> Self {
        let writer = SnapshotWriter::spawn(snapshots.clone());
        Self {
            tasks: Vec::new(),
            snapshots,
            writer,
        }
    }

    /// Populates the collection from the snapshot backend.
    ///
    /// A missing payload is the normal first run and yields an empty
    /// collection. An unreadable or undecodable payload also yields an
    /// empty collection, but the typed error is returned so the caller can
    /// notify the user; the store stays usable either way. A payload in
    /// the legacy version-less format is migrated and re-persisted in the
    /// current envelope.
    pub fn load(&mut self) -> StoreResult<()> {
        let started_at = Instant::now();

        let payload = match self.snapshots.read() {
            Ok(payload) => payload,
            Err(err) => {
                self.tasks.clear();
                error!(
                    "event=task_store_load module=store status=error stage=read error={err}"
                );
                return Err(StoreError::SnapshotRead(err));
            }
        };

        let Some(payload) = payload else {
            self.tasks.clear();
            info!(
                "event=task_store_load module=store status=ok tasks=0 source=first_run duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Ok(());
        };

        match codec::decode_snapshot(&payload) {
            Ok(decoded) => {
                let payload_version = decoded.payload_version;
                let migrate = !decoded.is_current();
                self.tasks = decoded.tasks;
                if migrate {
                    info!(
                        "event=snapshot_migrate module=store status=ok from_version={payload_version} to_version={SNAPSHOT_FORMAT_VERSION}"
                    );
                    self.schedule_persist();
                }
                info!(
                    "event=task_store_load module=store status=ok tasks={} duration_ms={}",
                    self.tasks.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                self.tasks.clear();
                error!(
                    "event=task_store_load module=store status=error stage=decode error={err}"
                );
                Err(StoreError::SnapshotDecode(err))
            }
        }
    }

    /// Creates a task and appends it to the collection.
    ///
    /// # Errors
    /// - `StoreError::Validation` when the title trims to empty.
    pub fn create(&mut self, title: &str, description: Option<&str>) -> StoreResult<Task> {
        let task = Task::new(title, description)?;
        self.tasks.push(task.clone());
        self.schedule_persist();
        Ok(task)
    }

    /// Applies a field patch to the record matching `id`.
    ///
    /// `updated_at` is refreshed even for an empty patch. A patch that
    /// would empty the title is rejected, mirroring the create rule.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> StoreResult<Task> {
        // Validate before locating so an invalid patch never half-applies.
        let title = patch.title.as_deref().map(normalize_title).transpose()?;

        let task = self.find_mut(id)?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = normalize_description(description.as_deref());
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        task.touch();
        let updated = task.clone();

        self.schedule_persist();
        Ok(updated)
    }

    /// Flips the completion flag of the record matching `id`.
    pub fn toggle_completion(&mut self, id: &str) -> StoreResult<Task> {
        let task = self.find_mut(id)?;
        task.completed = !task.completed;
        task.touch();
        let toggled = task.clone();

        self.schedule_persist();
        Ok(toggled)
    }

    /// Removes the record matching `id`.
    ///
    /// Returns whether a record was removed; deleting a missing id is an
    /// idempotent no-op, not an error.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            self.schedule_persist();
        }
        removed
    }

    /// Removes every completed record, returning the removed count.
    ///
    /// Zero matches is a no-op: nothing is persisted.
    pub fn delete_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.completed);
        let removed = before - self.tasks.len();
        if removed > 0 {
            self.schedule_persist();
        }
        removed
    }

    /// Full collection in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Records matching `filter`, preserving insertion order.
    pub fn filtered(&self, filter: Filter) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| filter.matches(task))
            .collect()
    }

    /// Active/completed tallies derived from current state.
    pub fn counts(&self) -> TaskCounts {
        let completed = self.tasks.iter().filter(|task| task.completed).count();
        TaskCounts {
            active: self.tasks.len() - completed,
            completed,
        }
    }

    /// Blocks until the background writer has drained.
    ///
    /// Returns the most recent write failure, if the last attempt failed.
    /// Intended for shutdown and tests; normal operation never waits on
    /// persistence.
    pub fn flush(&self) -> StoreResult<()> {
        self.writer.flush().map_err(StoreError::SnapshotWrite)
    }

    fn find_mut(&mut self, id: &str) -> StoreResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Serializes current state and hands it to the writer.
    ///
    /// Encoding happens here, synchronously with the mutation, so the
    /// queued payload can never be stale. An encode failure is logged and
    /// durability is retried on the next mutation's write.
    fn schedule_persist(&self) {
        match codec::encode_snapshot(&self.tasks) {
            Ok(payload) => self.writer.schedule(payload),
            Err(err) => {
                error!("event=snapshot_encode module=store status=error error={err}");
            }
        }
    }
}
