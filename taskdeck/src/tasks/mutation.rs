//! Create, update and delete round-trips against the remote store.
//!
//! [`TaskMutationCoordinator`] validates a [`TaskDraft`], performs the
//! remote call and, only on success, invalidates the list controller so the
//! next focus re-fetches server truth. Nothing is applied to the local view
//! ahead of the server: a failed mutation leaves the list exactly as it was.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use taskdeck_proto::{Priority, SessionIdentifier, Task, TaskId, ValidationFailure, validate_name};

use super::controller::TaskListController;
use crate::store::{TaskStore, TaskStoreError};

/// Editable contents of a task, without its id.
///
/// Updates are full replaces, so a draft for an existing task must carry
/// every field. Build it with [`TaskDraft::from_task`] and change only what
/// the user edited.
///
/// The name is validated and stored with surrounding whitespace removed, so
/// `"  Buy milk "` is saved as `"Buy milk"`. Every other field is sent as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub image_ref: Option<String>,
}

impl TaskDraft {
    /// A draft with just a name and default everything else.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A draft pre-populated from every field of `task`.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone(),
            priority: task.priority,
            due_date: task.due_date,
            completed: task.completed,
            image_ref: task.image_ref.clone(),
        }
    }

    /// Checks the draft before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationFailure`] for an empty or overlong name.
    pub fn validate(&self) -> Result<(), ValidationFailure> {
        validate_name(&self.name)
    }

    /// Builds the record to send, trimming the name.
    fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            name: self.name.trim().to_string(),
            description: self.description,
            priority: self.priority,
            due_date: self.due_date,
            completed: self.completed,
            image_ref: self.image_ref,
        }
    }
}

/// Successful mutation. Either way the caller should return to the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The task was created or replaced; carries the stored copy.
    Saved(Task),
    /// The task was deleted.
    Removed(TaskId),
}

impl MutationOutcome {
    /// Id of the affected task.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        match self {
            Self::Saved(task) => &task.id,
            Self::Removed(id) => id,
        }
    }
}

/// Why a mutation did not happen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// The draft was rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    /// The remote store rejected or never received the change.
    #[error("saving failed: {0}")]
    Remote(#[from] TaskStoreError),
    /// No one is signed in.
    #[error("not signed in")]
    SessionAbsent,
    /// Another mutation from this coordinator is still in flight.
    #[error("another change is still being saved")]
    Busy,
}

/// Clears the busy flag when the mutation finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs task mutations and keeps the list controller honest.
pub struct TaskMutationCoordinator<S> {
    store: Arc<S>,
    list: Arc<TaskListController<S>>,
    busy: AtomicBool,
}

impl<S: TaskStore> TaskMutationCoordinator<S> {
    /// Creates a coordinator writing to `store` and invalidating `list`.
    pub const fn new(store: Arc<S>, list: Arc<TaskListController<S>>) -> Self {
        Self {
            store,
            list,
            busy: AtomicBool::new(false),
        }
    }

    /// Whether a mutation is currently in flight. UIs disable their submit
    /// controls while this is true.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Creates a task from `draft` under a freshly generated id.
    ///
    /// # Errors
    ///
    /// See [`MutationError`]. Validation, session and busy failures make no
    /// network call.
    pub async fn add(&self, draft: TaskDraft) -> Result<MutationOutcome, MutationError> {
        draft.validate()?;
        let user = self.user()?;
        let _busy = self.begin()?;

        let task = draft.into_task(TaskId::generate());
        let stored = self
            .store
            .create(&user, &task)
            .await
            .inspect_err(|e| tracing::warn!(user = %user, task_id = %task.id, error = %e, "create failed"))?;

        self.list.invalidate();
        tracing::info!(user = %user, task_id = %stored.id, "task created");
        Ok(MutationOutcome::Saved(stored))
    }

    /// Replaces task `task_id` with the full contents of `draft`.
    ///
    /// # Errors
    ///
    /// See [`MutationError`].
    pub async fn update(
        &self,
        task_id: &TaskId,
        draft: TaskDraft,
    ) -> Result<MutationOutcome, MutationError> {
        draft.validate()?;
        let user = self.user()?;
        let _busy = self.begin()?;

        let task = draft.into_task(task_id.clone());
        let stored = self
            .store
            .update(&user, task_id, &task)
            .await
            .inspect_err(|e| tracing::warn!(user = %user, task_id = %task_id, error = %e, "update failed"))?;

        self.list.invalidate();
        tracing::info!(user = %user, task_id = %task_id, "task updated");
        Ok(MutationOutcome::Saved(stored))
    }

    /// Marks `task` done or not done, keeping every other field.
    ///
    /// # Errors
    ///
    /// See [`MutationError`].
    pub async fn set_completed(
        &self,
        task: &Task,
        completed: bool,
    ) -> Result<MutationOutcome, MutationError> {
        let draft = TaskDraft {
            completed,
            ..TaskDraft::from_task(task)
        };
        self.update(&task.id, draft).await
    }

    /// Deletes task `task_id`. Confirmation is the caller's job.
    ///
    /// # Errors
    ///
    /// See [`MutationError`].
    pub async fn remove(&self, task_id: &TaskId) -> Result<MutationOutcome, MutationError> {
        let user = self.user()?;
        let _busy = self.begin()?;

        self.store
            .delete(&user, task_id)
            .await
            .inspect_err(|e| tracing::warn!(user = %user, task_id = %task_id, error = %e, "delete failed"))?;

        self.list.invalidate();
        tracing::info!(user = %user, task_id = %task_id, "task deleted");
        Ok(MutationOutcome::Removed(task_id.clone()))
    }

    fn user(&self) -> Result<SessionIdentifier, MutationError> {
        self.list.identifier().ok_or(MutationError::SessionAbsent)
    }

    fn begin(&self) -> Result<BusyGuard<'_>, MutationError> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| MutationError::Busy)
    }
}
