//! Task domain types shared by the client and the reference server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Maximum allowed task name length in characters.
pub const MAX_TASK_NAME_LENGTH: usize = 256;

/// Identifier of a task within one user's collection.
///
/// Generated client-side at creation and never reassigned. Ids read back
/// from the remote store are taken verbatim, so they are not required to
/// be UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh random identifier (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority of a task. Serialized as `"Low"`, `"Medium"` or `"High"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Default priority.
    #[default]
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
}

impl Priority {
    /// Sort rank: High sorts first, Low last.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// A personal task as held in the local view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique within the owning user's collection.
    pub id: TaskId,
    /// Display name; never empty after trimming once accepted by validation.
    pub name: String,
    /// Free-form description, may be empty.
    pub description: String,
    /// Task priority.
    pub priority: Priority,
    /// Optional due instant.
    pub due_date: Option<DateTime<Utc>>,
    /// Whether the task is done.
    pub completed: bool,
    /// Opaque reference to an attached image owned elsewhere.
    pub image_ref: Option<String>,
}

impl Task {
    /// Creates an incomplete, low-priority task with the given id and name.
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            priority: Priority::Low,
            due_date: None,
            completed: false,
            image_ref: None,
        }
    }
}

/// Local validation errors raised before anything reaches the network.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Task name is empty or only whitespace.
    #[error("task name cannot be empty")]
    NameEmpty,
    /// Task name exceeds [`MAX_TASK_NAME_LENGTH`].
    #[error("task name too long (max 256 characters)")]
    NameTooLong,
}

/// Checks a task name: non-empty after trimming and within the length cap.
///
/// # Errors
///
/// Returns [`ValidationFailure::NameEmpty`] or [`ValidationFailure::NameTooLong`].
pub fn validate_name(name: &str) -> Result<(), ValidationFailure> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationFailure::NameEmpty);
    }
    if trimmed.chars().count() > MAX_TASK_NAME_LENGTH {
        return Err(ValidationFailure::NameTooLong);
    }
    Ok(())
}
