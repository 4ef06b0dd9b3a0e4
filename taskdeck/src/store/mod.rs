//! Remote task store abstraction.
//!
//! Defines the [`TaskStore`] trait for CRUD against a per-user task
//! collection keyed by task id. Concrete implementations:
//! - [`http::HttpTaskStore`]: JSON over HTTP against the task service
//! - [`memory::MemoryTaskStore`]: in-process store with call counting and
//!   failure injection for tests
//!
//! Stores never retry. A failed call is reported once and the caller
//! decides whether to try again.

pub mod http;
pub mod memory;

use taskdeck_proto::{SessionIdentifier, Task, TaskId};

/// Errors from a remote store round-trip.
///
/// Each variant carries the underlying message so it can be shown to the
/// user unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskStoreError {
    /// The request never produced a response (connect, DNS, body read...).
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("task service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, or the status reason when the body is empty.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response from task service: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TaskStoreError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<taskdeck_proto::WireError> for TaskStoreError {
    fn from(e: taskdeck_proto::WireError) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Async CRUD client for one remote task collection per user.
///
/// `update` is a full replace: every field of `task` is written and any
/// field left at its default clears the stored value.
pub trait TaskStore: Send + Sync {
    /// Fetches the user's whole collection in the service's order.
    fn list(
        &self,
        user: &SessionIdentifier,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, TaskStoreError>> + Send;

    /// Stores a new task. The id is chosen by the caller.
    fn create(
        &self,
        user: &SessionIdentifier,
        task: &Task,
    ) -> impl std::future::Future<Output = Result<Task, TaskStoreError>> + Send;

    /// Replaces the stored task `task_id` with `task`.
    fn update(
        &self,
        user: &SessionIdentifier,
        task_id: &TaskId,
        task: &Task,
    ) -> impl std::future::Future<Output = Result<Task, TaskStoreError>> + Send;

    /// Deletes the stored task `task_id`.
    fn delete(
        &self,
        user: &SessionIdentifier,
        task_id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), TaskStoreError>> + Send;
}
