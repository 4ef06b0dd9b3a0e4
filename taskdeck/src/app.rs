//! Screen flow: which screen is showing and what each user action triggers.
//!
//! [`App`] is the navigation state machine that ties the session, the list
//! controller and the mutation coordinator together. Front ends (the CLI in
//! `main.rs`, or any other renderer) call its methods in response to user
//! events and render [`App::snapshot`] plus [`App::route`].

use std::sync::Arc;

use taskdeck_proto::{SessionIdentifier, TaskId};

use crate::identity::{self, Credentials, IdentityError, IdentityService};
use crate::session::{KeyValueStore, SessionCache, SessionError};
use crate::store::{TaskStore, TaskStoreError};
use crate::tasks::{
    ListSnapshot, MutationError, MutationOutcome, RefreshOutcome, SortKey, TaskDraft,
    TaskListController, TaskMutationCoordinator,
};

/// Text shown when the list has nothing to display.
pub const EMPTY_LIST_MESSAGE: &str =
    "No tasks found. Please pull to refresh the page or add new task.";

/// Screen currently shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Sign-in / registration.
    Auth,
    /// The task list.
    TaskList,
    /// The task form; `None` when adding a new task.
    EditTask(Option<TaskId>),
}

/// Errors surfaced by screen actions.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("could not load tasks: {0}")]
    Fetch(#[from] TaskStoreError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The requested task is not in the current view.
    #[error("no task with id {0}")]
    UnknownTask(TaskId),

    /// `submit` was called while no task form was open.
    #[error("no task form is open")]
    NotEditing,

    /// The action needs a signed-in user.
    #[error("not signed in")]
    SessionAbsent,
}

/// Navigation state plus the components every screen shares.
pub struct App<S, K> {
    session: SessionCache<K>,
    list: Arc<TaskListController<S>>,
    mutations: TaskMutationCoordinator<S>,
    route: Route,
}

impl<S: TaskStore, K: KeyValueStore> App<S, K> {
    /// Creates the app on the sign-in screen. Call [`mount`](Self::mount)
    /// before anything else.
    pub fn new(store: Arc<S>, session: SessionCache<K>) -> Self {
        let list = Arc::new(TaskListController::new(Arc::clone(&store)));
        let mutations = TaskMutationCoordinator::new(store, Arc::clone(&list));
        Self {
            session,
            list,
            mutations,
            route: Route::Auth,
        }
    }

    /// Startup: routes to sign-in without a stored session, otherwise to the
    /// list and loads it.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if the initial load fails. The route is
    /// still [`Route::TaskList`] so the user can retry.
    pub async fn mount(&mut self) -> Result<&Route, AppError> {
        if self.list.initialize(&self.session).await.is_none() {
            tracing::info!("no stored session; showing sign-in");
            self.route = Route::Auth;
            return Ok(&self.route);
        }
        self.route = Route::TaskList;
        self.list.on_focus().await?;
        Ok(&self.route)
    }

    /// The list screen regained focus.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if a reload was needed and failed.
    pub async fn focus(&mut self) -> Result<RefreshOutcome, AppError> {
        if self.route == Route::Auth {
            return Err(AppError::SessionAbsent);
        }
        self.route = Route::TaskList;
        Ok(self.list.on_focus().await?)
    }

    /// Explicit pull-to-refresh.
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn pull_to_refresh(&mut self) -> Result<RefreshOutcome, AppError> {
        self.list.invalidate();
        self.focus().await
    }

    /// Re-orders the list in place.
    pub fn sort_by(&self, key: SortKey) {
        self.list.sort_by(key);
    }

    /// Opens the task form, pre-populated from `task_id` when editing.
    ///
    /// # Errors
    ///
    /// [`AppError::SessionAbsent`] when signed out, or
    /// [`AppError::UnknownTask`] if `task_id` is not in the current view.
    pub fn open_editor(&mut self, task_id: Option<&TaskId>) -> Result<TaskDraft, AppError> {
        if self.list.identifier().is_none() {
            self.route = Route::Auth;
            return Err(AppError::SessionAbsent);
        }
        let draft = match task_id {
            None => TaskDraft::default(),
            Some(id) => self
                .list
                .tasks()
                .iter()
                .find(|t| &t.id == id)
                .map(TaskDraft::from_task)
                .ok_or_else(|| AppError::UnknownTask(id.clone()))?,
        };
        self.route = Route::EditTask(task_id.cloned());
        Ok(draft)
    }

    /// Saves the open form: creates a task or replaces the one being edited.
    ///
    /// On success returns to the list and reloads it. On failure the form
    /// stays open.
    ///
    /// # Errors
    ///
    /// [`AppError::NotEditing`] without an open form, otherwise the
    /// mutation error.
    pub async fn submit(&mut self, draft: TaskDraft) -> Result<MutationOutcome, AppError> {
        let Route::EditTask(target) = &self.route else {
            return Err(AppError::NotEditing);
        };
        let outcome = match target {
            Some(id) => self.mutations.update(id, draft).await?,
            None => self.mutations.add(draft).await?,
        };
        self.return_to_list().await;
        Ok(outcome)
    }

    /// Deletes a task. The caller has already asked for confirmation.
    ///
    /// # Errors
    ///
    /// The mutation error.
    pub async fn delete(&mut self, task_id: &TaskId) -> Result<MutationOutcome, AppError> {
        let outcome = self.mutations.remove(task_id).await?;
        self.return_to_list().await;
        Ok(outcome)
    }

    /// Flips the completion flag of a task in the current view.
    ///
    /// # Errors
    ///
    /// [`AppError::UnknownTask`] or the mutation error.
    pub async fn toggle_completed(&mut self, task_id: &TaskId) -> Result<MutationOutcome, AppError> {
        let task = self
            .list
            .tasks()
            .into_iter()
            .find(|t| &t.id == task_id)
            .ok_or_else(|| AppError::UnknownTask(task_id.clone()))?;
        let outcome = self.mutations.set_completed(&task, !task.completed).await?;
        self.return_to_list().await;
        Ok(outcome)
    }

    /// Signs in through `identity` and mounts the list.
    ///
    /// # Errors
    ///
    /// The identity error, or the initial fetch error.
    pub async fn login<I: IdentityService>(
        &mut self,
        identity: &I,
        creds: &Credentials,
    ) -> Result<&Route, AppError> {
        identity::login(identity, &self.session, creds).await?;
        self.mount().await
    }

    /// Stores an identifier handed out by the identity provider and mounts
    /// the list.
    ///
    /// # Errors
    ///
    /// The session storage error, or the initial fetch error.
    pub async fn adopt_session(&mut self, id: &SessionIdentifier) -> Result<&Route, AppError> {
        self.session.set(id).await?;
        tracing::info!(user = %id, "session stored");
        self.mount().await
    }

    /// Signs out, drops the view and shows the sign-in screen.
    ///
    /// # Errors
    ///
    /// The session storage error. The view is dropped regardless.
    pub async fn logout(&mut self) -> Result<(), AppError> {
        self.list.reset();
        self.route = Route::Auth;
        identity::logout(&self.session).await?;
        Ok(())
    }

    async fn return_to_list(&mut self) {
        self.route = Route::TaskList;
        if let Err(e) = self.list.on_focus().await {
            tracing::warn!(error = %e, "reload after save failed");
        }
    }

    /// Current screen.
    #[must_use]
    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// What the list screen should render.
    #[must_use]
    pub fn snapshot(&self) -> ListSnapshot {
        self.list.snapshot()
    }

    /// Whether a save or delete is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.mutations.is_busy()
    }

    /// The list controller shared by every screen.
    #[must_use]
    pub const fn list(&self) -> &Arc<TaskListController<S>> {
        &self.list
    }

    /// The session cache.
    #[must_use]
    pub const fn session(&self) -> &SessionCache<K> {
        &self.session
    }
}
