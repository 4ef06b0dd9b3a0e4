//! List-state engine for the signed-in user's tasks.
//!
//! [`TaskListController`] owns the local, ordered copy of the remote
//! collection and its fetch lifecycle:
//!
//! ```text
//! Idle ──refresh──▶ Fetching ──ok──▶ Ready
//!                      │               │
//!                      └──err──▶ Failed ◀┘ (next refresh)
//! ```
//!
//! Every trigger that wants fresh data (mount, regained focus, pull to
//! refresh) goes through [`refresh`](TaskListController::refresh), which is
//! single-flight: while a fetch is running, further calls return
//! [`RefreshOutcome::InFlight`] without touching the network. After a
//! mutation, [`invalidate`](TaskListController::invalidate) marks the view
//! stale so the next refresh always goes to the network. The view is never
//! patched locally.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use taskdeck_proto::{SessionIdentifier, Task};

use super::sort::{SortKey, sort_tasks};
use crate::session::{KeyValueStore, SessionCache};
use crate::store::{TaskStore, TaskStoreError};

/// Fetch lifecycle of the list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchState {
    /// Nothing fetched yet (or signed out).
    #[default]
    Idle,
    /// A `list` call is in flight.
    Fetching,
    /// The last fetch succeeded.
    Ready,
    /// The last fetch failed; the view is empty.
    Failed,
}

/// What a call to [`TaskListController::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A fetch ran and replaced the view with `count` tasks.
    Loaded {
        /// Number of tasks now in the view.
        count: usize,
    },
    /// Another fetch was already running; this call did nothing.
    InFlight,
    /// The view was fresh; no fetch was needed (focus trigger only).
    UpToDate,
    /// No session identifier; nothing was fetched.
    Unauthenticated,
    /// The fetch completed after a newer one started and was discarded.
    Superseded,
}

/// Read-only copy of the controller state for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSnapshot {
    /// Active session, if any.
    pub identifier: Option<SessionIdentifier>,
    /// Fetch lifecycle state.
    pub fetch_state: FetchState,
    /// Tasks in display order.
    pub tasks: Vec<Task>,
    /// Ordering currently applied to `tasks`.
    pub sort_key: SortKey,
    /// Message of the last failed fetch.
    pub last_error: Option<String>,
}

impl ListSnapshot {
    /// Whether the UI should show the "no tasks" message.
    ///
    /// True for a successful empty fetch and for a failed fetch alike.
    #[must_use]
    pub fn is_empty_state(&self) -> bool {
        matches!(self.fetch_state, FetchState::Ready | FetchState::Failed) && self.tasks.is_empty()
    }
}

#[derive(Default)]
struct ListState {
    identifier: Option<SessionIdentifier>,
    /// View in display order.
    tasks: Vec<Task>,
    /// Same tasks in fetch order, used to undo a sort.
    fetched: Vec<Task>,
    fetch_state: FetchState,
    sort_key: SortKey,
    last_error: Option<TaskStoreError>,
    /// Set by `invalidate`, cleared when a fetch starts.
    stale: bool,
    /// Number of the most recently started fetch.
    generation: u64,
}

/// Owns the in-memory task view and its fetch lifecycle.
///
/// All methods take `&self`; state sits behind a mutex that is never held
/// across an `.await`, so concurrent triggers on the same controller are
/// safe and collapse into one fetch.
pub struct TaskListController<S> {
    store: Arc<S>,
    state: Mutex<ListState>,
}

impl<S: TaskStore> TaskListController<S> {
    /// Creates an idle controller with no session.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: Mutex::new(ListState::default()),
        }
    }

    /// Loads the session identifier from `session`.
    ///
    /// Returns the identifier, or `None` when signed out, in which case the
    /// controller stays `Idle` and the caller should route to sign-in.
    pub async fn initialize<K: KeyValueStore>(
        &self,
        session: &SessionCache<K>,
    ) -> Option<SessionIdentifier> {
        let identifier = session.get().await;
        let mut state = self.state.lock();
        if state.identifier != identifier {
            tracing::debug!(user = ?identifier, "session changed; clearing view");
            *state = ListState {
                identifier: identifier.clone(),
                generation: state.generation + 1,
                ..ListState::default()
            };
        }
        identifier
    }

    /// Fetches the collection unless a fetch is already running.
    ///
    /// A fetch started after [`invalidate`](Self::invalidate) bypasses the
    /// in-flight check, and the older fetch's result is then discarded.
    ///
    /// # Errors
    ///
    /// Returns the store error when the fetch fails. The view is emptied,
    /// the state becomes `Failed` and the message is kept in
    /// [`ListSnapshot::last_error`].
    pub async fn refresh(&self) -> Result<RefreshOutcome, TaskStoreError> {
        let (user, generation) = {
            let mut state = self.state.lock();
            let Some(user) = state.identifier.clone() else {
                tracing::debug!("refresh without session; staying idle");
                return Ok(RefreshOutcome::Unauthenticated);
            };
            if state.fetch_state == FetchState::Fetching && !state.stale {
                tracing::debug!(user = %user, "fetch already in flight; skipping refresh");
                return Ok(RefreshOutcome::InFlight);
            }
            state.generation += 1;
            state.stale = false;
            state.fetch_state = FetchState::Fetching;
            (user, state.generation)
        };

        tracing::debug!(user = %user, generation, "fetching tasks");
        let result = self.store.list(&user).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(user = %user, generation, "discarding superseded fetch");
            return Ok(RefreshOutcome::Superseded);
        }
        match result {
            Ok(tasks) => {
                let count = tasks.len();
                state.fetched.clone_from(&tasks);
                state.tasks = tasks;
                state.sort_key = SortKey::None;
                state.fetch_state = FetchState::Ready;
                state.last_error = None;
                drop(state);
                tracing::info!(user = %user, count, "tasks fetched");
                Ok(RefreshOutcome::Loaded { count })
            }
            Err(e) => {
                state.tasks.clear();
                state.fetched.clear();
                state.sort_key = SortKey::None;
                state.fetch_state = FetchState::Failed;
                state.last_error = Some(e.clone());
                drop(state);
                tracing::warn!(user = %user, error = %e, "task fetch failed");
                Err(e)
            }
        }
    }

    /// Navigation-focus trigger: fetches only when the view needs it.
    ///
    /// A fetch runs when nothing has loaded yet, the last fetch failed, or
    /// the view was invalidated. Otherwise returns
    /// [`RefreshOutcome::UpToDate`].
    ///
    /// # Errors
    ///
    /// Same as [`refresh`](Self::refresh).
    pub async fn on_focus(&self) -> Result<RefreshOutcome, TaskStoreError> {
        let needs_fetch = {
            let state = self.state.lock();
            match state.fetch_state {
                FetchState::Idle | FetchState::Failed => true,
                FetchState::Ready | FetchState::Fetching => state.stale,
            }
        };
        if !needs_fetch {
            return Ok(RefreshOutcome::UpToDate);
        }
        self.refresh().await
    }

    /// Marks the view stale after a successful mutation.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.stale = true;
        tracing::debug!(fetch_state = ?state.fetch_state, "task view invalidated");
    }

    /// Re-orders the view in place without a network call.
    ///
    /// [`SortKey::None`] restores fetch order. The next fetch resets the
    /// ordering to `None`.
    pub fn sort_by(&self, key: SortKey) {
        let now = Utc::now();
        let mut state = self.state.lock();
        if key == SortKey::None {
            state.tasks = state.fetched.clone();
        } else {
            sort_tasks(&mut state.tasks, key, now);
        }
        state.sort_key = key;
    }

    /// Forgets the session and the view (logout).
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let generation = state.generation + 1;
        *state = ListState {
            generation,
            ..ListState::default()
        };
    }

    /// Active session identifier, if any.
    pub fn identifier(&self) -> Option<SessionIdentifier> {
        self.state.lock().identifier.clone()
    }

    /// Current fetch state.
    pub fn fetch_state(&self) -> FetchState {
        self.state.lock().fetch_state
    }

    /// Copy of the view in display order.
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    /// Whether a mutation has invalidated the view since the last fetch began.
    pub fn is_stale(&self) -> bool {
        self.state.lock().stale
    }

    /// Copy of the whole state for rendering.
    pub fn snapshot(&self) -> ListSnapshot {
        let state = self.state.lock();
        ListSnapshot {
            identifier: state.identifier.clone(),
            fetch_state: state.fetch_state,
            tasks: state.tasks.clone(),
            sort_key: state.sort_key,
            last_error: state.last_error.as_ref().map(ToString::to_string),
        }
    }
}
