//! In-process task store for testing.
//!
//! Behaves like the remote service (per-user, insertion-ordered, full
//! replace on update) and additionally counts calls, injects failures and
//! can hold `list` calls open so tests can pile up concurrent refreshes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use taskdeck_proto::{SessionIdentifier, Task, TaskId};
use tokio::sync::watch;

use super::{TaskStore, TaskStoreError};

/// Number of calls each operation has received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `list` calls.
    pub list: usize,
    /// `create` calls.
    pub create: usize,
    /// `update` calls.
    pub update: usize,
    /// `delete` calls.
    pub delete: usize,
}

impl CallCounts {
    /// Total calls across all operations.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.list + self.create + self.update + self.delete
    }
}

/// Task store backed by in-process maps.
pub struct MemoryTaskStore {
    collections: Mutex<HashMap<String, Vec<Task>>>,
    failure: Mutex<Option<TaskStoreError>>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    lists_held: watch::Sender<bool>,
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            lists_held: watch::channel(false).0,
        }
    }

    /// Replaces a user's collection.
    pub fn seed(&self, user: &SessionIdentifier, tasks: Vec<Task>) {
        self.collections
            .lock()
            .insert(user.as_str().to_string(), tasks);
    }

    /// Returns a copy of a user's collection.
    #[must_use]
    pub fn tasks(&self, user: &SessionIdentifier) -> Vec<Task> {
        self.collections
            .lock()
            .get(user.as_str())
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every operation fail with `error` until cleared with `None`.
    pub fn set_failure(&self, error: Option<TaskStoreError>) {
        *self.failure.lock() = error;
    }

    /// Makes `list` calls wait until [`release_lists`](Self::release_lists).
    pub fn hold_lists(&self) {
        self.lists_held.send_replace(true);
    }

    /// Lets held and future `list` calls complete.
    pub fn release_lists(&self) {
        self.lists_held.send_replace(false);
    }

    /// Snapshot of the call counters.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            list: self.list_calls.load(Ordering::SeqCst),
            create: self.create_calls.load(Ordering::SeqCst),
            update: self.update_calls.load(Ordering::SeqCst),
            delete: self.delete_calls.load(Ordering::SeqCst),
        }
    }

    fn check_failure(&self) -> Result<(), TaskStoreError> {
        self.failure.lock().clone().map_or(Ok(()), Err)
    }
}

impl TaskStore for MemoryTaskStore {
    async fn list(&self, user: &SessionIdentifier) -> Result<Vec<Task>, TaskStoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut held = self.lists_held.subscribe();
        // Sender lives in `self`, so the channel cannot close while we wait.
        let _ = held.wait_for(|held| !*held).await;
        tokio::task::yield_now().await;
        self.check_failure()?;
        Ok(self.tasks(user))
    }

    async fn create(&self, user: &SessionIdentifier, task: &Task) -> Result<Task, TaskStoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check_failure()?;
        let mut collections = self.collections.lock();
        let collection = collections.entry(user.as_str().to_string()).or_default();
        if collection.iter().any(|t| t.id == task.id) {
            return Err(TaskStoreError::Status {
                status: 409,
                message: format!("task {} already exists", task.id),
            });
        }
        collection.push(task.clone());
        drop(collections);
        Ok(task.clone())
    }

    async fn update(
        &self,
        user: &SessionIdentifier,
        task_id: &TaskId,
        task: &Task,
    ) -> Result<Task, TaskStoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check_failure()?;
        let mut stored = task.clone();
        stored.id = task_id.clone();
        let mut collections = self.collections.lock();
        let Some(slot) = collections
            .get_mut(user.as_str())
            .and_then(|c| c.iter_mut().find(|t| &t.id == task_id))
        else {
            return Err(TaskStoreError::Status {
                status: 404,
                message: format!("task {task_id} not found"),
            });
        };
        *slot = stored.clone();
        drop(collections);
        Ok(stored)
    }

    async fn delete(&self, user: &SessionIdentifier, task_id: &TaskId) -> Result<(), TaskStoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check_failure()?;
        if let Some(collection) = self.collections.lock().get_mut(user.as_str()) {
            collection.retain(|t| &t.id != task_id);
        }
        Ok(())
    }
}
