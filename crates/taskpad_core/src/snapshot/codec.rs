//! Versioned snapshot payload codec.
//!
//! # Responsibility
//! - Encode the task collection as the current JSON envelope.
//! - Decode current and legacy payloads back into validated records.
//!
//! # Invariants
//! - Written payloads always carry an explicit `version` field.
//! - Decoded records must pass `Task::validate()` and have pairwise
//!   distinct ids; an invalid payload is rejected as a whole.

use crate::model::task::{Task, TaskId, TaskValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Version written by this binary.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    tasks: &'a [Task],
}

#[derive(Deserialize)]
struct Envelope {
    #[allow(dead_code)]
    version: u32,
    tasks: Vec<Task>,
}

/// Result of a successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSnapshot {
    pub tasks: Vec<Task>,
    /// Version found in the payload; `0` marks the version-less legacy
    /// bare-array form written by earlier app releases.
    pub payload_version: u32,
}

impl DecodedSnapshot {
    /// Returns whether the payload was already in the current format.
    pub fn is_current(&self) -> bool {
        self.payload_version == SNAPSHOT_FORMAT_VERSION
    }
}

/// Failures while decoding a stored payload.
#[derive(Debug)]
pub enum DecodeError {
    Parse(serde_json::Error),
    MissingFormatVersion,
    UnsupportedFormatVersion {
        payload_version: u32,
        latest_supported: u32,
    },
    InvalidTask(TaskValidationError),
    DuplicateTaskId(TaskId),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "snapshot payload is not valid JSON: {err}"),
            Self::MissingFormatVersion => {
                write!(f, "snapshot payload has no `version` field")
            }
            Self::UnsupportedFormatVersion {
                payload_version,
                latest_supported,
            } => write!(
                f,
                "snapshot format version {payload_version} is newer than supported {latest_supported}"
            ),
            Self::InvalidTask(err) => write!(f, "snapshot contains an invalid task: {err}"),
            Self::DuplicateTaskId(id) => {
                write!(f, "snapshot contains duplicate task id: {id}")
            }
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidTask(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for DecodeError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidTask(value)
    }
}

/// Serializes the collection as the current envelope.
pub fn encode_snapshot(tasks: &[Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EnvelopeRef {
        version: SNAPSHOT_FORMAT_VERSION,
        tasks,
    })
}

/// Parses and validates a stored payload.
///
/// Accepts the current envelope and the legacy bare-array form. Rejects
/// payloads from a newer format version before touching task fields, so a
/// future shape change surfaces as a version error rather than a parse
/// error.
pub fn decode_snapshot(payload: &str) -> Result<DecodedSnapshot, DecodeError> {
    let value: Value = serde_json::from_str(payload).map_err(DecodeError::Parse)?;

    let (payload_version, tasks) = if value.is_array() {
        let tasks: Vec<Task> = serde_json::from_value(value).map_err(DecodeError::Parse)?;
        (0, tasks)
    } else {
        let payload_version = value
            .get("version")
            .and_then(Value::as_u64)
            .ok_or(DecodeError::MissingFormatVersion)? as u32;
        if payload_version > SNAPSHOT_FORMAT_VERSION {
            return Err(DecodeError::UnsupportedFormatVersion {
                payload_version,
                latest_supported: SNAPSHOT_FORMAT_VERSION,
            });
        }
        let envelope: Envelope = serde_json::from_value(value).map_err(DecodeError::Parse)?;
        (payload_version, envelope.tasks)
    };

    let mut seen_ids: HashSet<&str> = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        task.validate()?;
        if !seen_ids.insert(task.id.as_str()) {
            return Err(DecodeError::DuplicateTaskId(task.id.clone()));
        }
    }

    Ok(DecodedSnapshot {
        tasks,
        payload_version,
    })
}
