//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record persisted by the snapshot layer.
//! - Provide creation and patch helpers that keep the record valid.
//!
//! # Invariants
//! - `id` is stable for the record lifetime and unique in a collection.
//! - `title` is trimmed and non-empty.
//! - `updated_at >= created_at`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a task record.
///
/// Kept as an opaque string alias: new records get UUIDv4 ids, but ids
/// written by earlier app releases (epoch-millis strings) stay readable.
pub type TaskId = String;

/// Validation failures for a task record or a field patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// Record id is empty.
    EmptyId,
    /// `updated_at` is earlier than `created_at`.
    TimestampOrder { created_at: i64, updated_at: i64 },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be empty"),
            Self::EmptyId => write!(f, "task id must not be empty"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
///
/// Wire field names are camelCase to match the persisted snapshot contract
/// shared with the app front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable id used for lookups and cross-referencing from the view layer.
    pub id: TaskId,
    /// Short task text, trimmed, never empty.
    pub title: String,
    /// Optional longer text; absent on the wire when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion flag toggled by the view layer.
    pub completed: bool,
    /// Unix epoch milliseconds, set once at creation.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on every mutation.
    pub updated_at: i64,
}

impl Task {
    /// Creates a new record with a generated id and both timestamps set to now.
    ///
    /// # Errors
    /// - `TaskValidationError::EmptyTitle` when `title` trims to empty.
    pub fn new(
        title: impl AsRef<str>,
        description: Option<&str>,
    ) -> Result<Self, TaskValidationError> {
        let title = normalize_title(title.as_ref())?;
        let now = now_epoch_ms();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: normalize_description(description),
            completed: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Checks record-level invariants.
    ///
    /// Also run against decoded snapshot records, so an invalid persisted
    /// payload is rejected instead of masked.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.updated_at < self.created_at {
            return Err(TaskValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }

    /// Refreshes `updated_at`, clamping so the timestamp invariant holds
    /// even when the wall clock steps backwards.
    pub(crate) fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.created_at);
    }
}

/// Field changes applied by `TaskStore::update`.
///
/// `None` leaves a field untouched. For `description`, `Some(None)` clears
/// the field while `Some(Some(text))` replaces it.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Returns whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// View-layer selector over the collection. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Every record, insertion order.
    #[default]
    All,
    /// Records with `completed == false`.
    Active,
    /// Records with `completed == true`.
    Completed,
}

impl Filter {
    /// Returns whether a record matches this selector.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

/// Derived completion tallies for the stats header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub active: usize,
    pub completed: usize,
}

impl TaskCounts {
    /// Total collection size.
    pub fn total(&self) -> usize {
        self.active + self.completed
    }
}

/// Trims and validates a title value.
pub(crate) fn normalize_title(title: &str) -> Result<String, TaskValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Trims a description; whitespace-only input normalizes to `None`.
pub(crate) fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Current wall-clock time in Unix epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
