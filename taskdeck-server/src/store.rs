//! In-memory per-user task repository.
//!
//! The [`TaskRepository`] holds one insertion-ordered collection of
//! [`TaskRecord`]s per user. Collection order is the order tasks were
//! created in; a full-replace update keeps the task's position.

use std::collections::HashMap;

use taskdeck_proto::wire::TaskRecord;
use tokio::sync::RwLock;

/// Outcome of a repository write that can conflict with existing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was applied; carries the stored record.
    Stored(TaskRecord),
    /// `insert` found a task with the same id already present.
    AlreadyExists,
    /// `replace` found no task with the given id.
    NotFound,
}

/// In-memory task collections keyed by user identifier.
///
/// Thread-safe via [`RwLock`]. Each user has an independent collection.
#[derive(Default)]
pub struct TaskRepository {
    collections: RwLock<HashMap<String, Vec<TaskRecord>>>,
}

impl TaskRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of a user's collection in insertion order.
    ///
    /// Unknown users have an empty collection.
    pub async fn list(&self, user: &str) -> Vec<TaskRecord> {
        let collections = self.collections.read().await;
        collections.get(user).cloned().unwrap_or_default()
    }

    /// Appends a record to a user's collection.
    ///
    /// Returns [`WriteOutcome::AlreadyExists`] if a record with the same
    /// `task_id` is already stored. The create handler assigns a fresh id to
    /// bodies that arrive without one, so stored records are always
    /// addressable by id.
    pub async fn insert(&self, user: &str, record: TaskRecord) -> WriteOutcome {
        let mut collections = self.collections.write().await;
        let collection = collections.entry(user.to_string()).or_default();
        if collection.iter().any(|r| r.task_id == record.task_id) {
            return WriteOutcome::AlreadyExists;
        }
        collection.push(record.clone());
        drop(collections);
        WriteOutcome::Stored(record)
    }

    /// Replaces the whole record for `task_id`, keeping its position.
    pub async fn replace(&self, user: &str, task_id: &str, mut record: TaskRecord) -> WriteOutcome {
        record.task_id = Some(task_id.to_string());
        let mut collections = self.collections.write().await;
        let Some(slot) = collections
            .get_mut(user)
            .and_then(|c| c.iter_mut().find(|r| r.task_id.as_deref() == Some(task_id)))
        else {
            return WriteOutcome::NotFound;
        };
        *slot = record.clone();
        drop(collections);
        WriteOutcome::Stored(record)
    }

    /// Removes a task, returning whether it existed.
    pub async fn remove(&self, user: &str, task_id: &str) -> bool {
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(user) else {
            return false;
        };
        let before = collection.len();
        collection.retain(|r| r.task_id.as_deref() != Some(task_id));
        before != collection.len()
    }

    /// Number of tasks stored for a user.
    pub async fn len(&self, user: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(user).map_or(0, Vec::len)
    }
}
