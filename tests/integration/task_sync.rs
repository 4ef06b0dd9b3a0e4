//! Integration tests for the list/mutation synchronization cycle.
//!
//! Drives `TaskListController` and `TaskMutationCoordinator` together
//! against the in-process `MemoryTaskStore`, checking fetch counts,
//! invalidation and failure isolation end to end.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use taskdeck::session::SessionCache;
use taskdeck::session::memory::MemoryKvStore;
use taskdeck::store::TaskStoreError;
use taskdeck::store::memory::MemoryTaskStore;
use taskdeck::tasks::{
    FetchState, MutationError, RefreshOutcome, SortKey, TaskDraft, TaskListController,
    TaskMutationCoordinator,
};
use taskdeck_proto::{Priority, SessionIdentifier, Task, TaskId, ValidationFailure};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    store: Arc<MemoryTaskStore>,
    list: Arc<TaskListController<MemoryTaskStore>>,
    mutations: TaskMutationCoordinator<MemoryTaskStore>,
}

fn uid() -> SessionIdentifier {
    SessionIdentifier::new("user-1").unwrap()
}

fn task(id: &str, priority: Priority) -> Task {
    let mut task = Task::new(TaskId::from(id), format!("task {id}"));
    task.priority = priority;
    task
}

/// Signed-in harness whose store holds `tasks`. Nothing is fetched yet.
async fn harness(tasks: Vec<Task>) -> Harness {
    let store = Arc::new(MemoryTaskStore::new());
    store.seed(&uid(), tasks);

    let session = SessionCache::new(MemoryKvStore::new());
    session.set(&uid()).await.unwrap();

    let list = Arc::new(TaskListController::new(Arc::clone(&store)));
    assert_eq!(list.initialize(&session).await, Some(uid()));
    let mutations = TaskMutationCoordinator::new(Arc::clone(&store), Arc::clone(&list));
    Harness {
        store,
        list,
        mutations,
    }
}

fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Fetch lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn simultaneous_triggers_issue_one_list_call() {
    let h = harness(vec![task("a", Priority::Low)]).await;

    let (mount, focus, watcher) =
        tokio::join!(h.list.on_focus(), h.list.on_focus(), h.list.refresh());

    assert_eq!(mount.unwrap(), RefreshOutcome::Loaded { count: 1 });
    // Focus sees a fetch already under way for a fresh view.
    assert_eq!(focus.unwrap(), RefreshOutcome::UpToDate);
    assert_eq!(watcher.unwrap(), RefreshOutcome::InFlight);
    assert_eq!(h.store.calls().list, 1);
    assert_eq!(h.list.fetch_state(), FetchState::Ready);
}

#[tokio::test]
async fn burst_of_refreshes_collapses_into_one_fetch() {
    let h = harness(vec![task("a", Priority::Low), task("b", Priority::Low)]).await;

    let outcomes = futures_util::future::join_all((0..8).map(|_| h.list.refresh())).await;

    let loaded = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(RefreshOutcome::Loaded { count: 2 })))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(o, Ok(RefreshOutcome::InFlight)))
        .count();
    assert_eq!((loaded, skipped), (1, 7));
    assert_eq!(h.store.calls().list, 1);
}

#[tokio::test]
async fn absent_session_never_fetches() {
    let store = Arc::new(MemoryTaskStore::new());
    let list = TaskListController::new(Arc::clone(&store));
    let session = SessionCache::new(MemoryKvStore::new());

    assert_eq!(list.initialize(&session).await, None);
    assert_eq!(list.refresh().await.unwrap(), RefreshOutcome::Unauthenticated);
    assert_eq!(list.on_focus().await.unwrap(), RefreshOutcome::Unauthenticated);
    assert_eq!(store.calls().total(), 0);
    assert_eq!(list.fetch_state(), FetchState::Idle);
}

#[tokio::test]
async fn failed_fetch_shows_empty_state_and_refocus_retries() {
    let h = harness(vec![task("a", Priority::Low)]).await;
    h.store
        .set_failure(Some(TaskStoreError::Transport("connection refused".to_string())));

    assert!(h.list.on_focus().await.is_err());
    let snapshot = h.list.snapshot();
    assert_eq!(snapshot.fetch_state, FetchState::Failed);
    assert!(snapshot.is_empty_state());
    assert!(snapshot.last_error.unwrap().contains("connection refused"));

    h.store.set_failure(None);
    assert_eq!(
        h.list.on_focus().await.unwrap(),
        RefreshOutcome::Loaded { count: 1 }
    );
    assert_eq!(h.list.snapshot().last_error, None);
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_mutation_forces_next_focus_to_fetch() {
    let h = harness(vec![]).await;
    h.list.on_focus().await.unwrap();
    assert_eq!(h.list.on_focus().await.unwrap(), RefreshOutcome::UpToDate);
    assert_eq!(h.store.calls().list, 1);

    h.mutations.add(TaskDraft::new("Buy milk")).await.unwrap();

    assert_eq!(
        h.list.on_focus().await.unwrap(),
        RefreshOutcome::Loaded { count: 1 }
    );
    assert_eq!(h.store.calls().list, 2);
    assert_eq!(h.list.tasks()[0].name, "Buy milk");
}

#[tokio::test]
async fn invalidate_during_fetch_still_refetches() {
    let h = harness(vec![task("a", Priority::Low)]).await;
    h.store.hold_lists();

    let (first, second) = tokio::join!(h.list.refresh(), async {
        tokio::task::yield_now().await;
        h.store.seed(&uid(), vec![task("a", Priority::Low), task("b", Priority::High)]);
        h.list.invalidate();
        let pending = h.list.refresh();
        h.store.release_lists();
        pending.await
    });

    assert_eq!(first.unwrap(), RefreshOutcome::Superseded);
    assert_eq!(second.unwrap(), RefreshOutcome::Loaded { count: 2 });
    assert_eq!(h.store.calls().list, 2);
    assert_eq!(ids(&h.list.tasks()), vec!["a", "b"]);
}

#[tokio::test]
async fn blank_names_are_rejected_before_the_network() {
    let h = harness(vec![]).await;
    for name in ["", "   ", "\t\n"] {
        let err = h.mutations.add(TaskDraft::new(name)).await.unwrap_err();
        assert_eq!(err, MutationError::Validation(ValidationFailure::NameEmpty));
    }
    let too_long = "x".repeat(257);
    let err = h.mutations.add(TaskDraft::new(too_long)).await.unwrap_err();
    assert!(matches!(err, MutationError::Validation(ValidationFailure::NameTooLong)));
    assert_eq!(h.store.calls().total(), 0);
}

#[tokio::test]
async fn failed_update_leaves_local_list_unchanged() {
    let h = harness(vec![task("a", Priority::Low), task("b", Priority::High)]).await;
    h.list.refresh().await.unwrap();
    h.list.sort_by(SortKey::Priority);
    let before = h.list.snapshot();

    h.store.set_failure(Some(TaskStoreError::Status {
        status: 503,
        message: "maintenance".to_string(),
    }));
    let edited = TaskDraft {
        name: "renamed".to_string(),
        ..TaskDraft::from_task(&before.tasks[0])
    };
    let err = h.mutations.update(&before.tasks[0].id, edited).await.unwrap_err();

    assert!(matches!(err, MutationError::Remote(TaskStoreError::Status { status: 503, .. })));
    assert_eq!(h.list.snapshot(), before);
    assert_eq!(h.list.on_focus().await.unwrap(), RefreshOutcome::UpToDate);
}

#[tokio::test]
async fn delete_then_focus_drops_the_task() {
    let h = harness(vec![task("a", Priority::Low), task("b", Priority::Low)]).await;
    h.list.refresh().await.unwrap();

    h.mutations.remove(&TaskId::from("a")).await.unwrap();
    h.list.on_focus().await.unwrap();

    assert_eq!(ids(&h.list.tasks()), vec!["b"]);
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn priority_sort_is_stable_and_fetch_resets_it() {
    let h = harness(vec![
        task("1", Priority::High),
        task("2", Priority::High),
        task("3", Priority::Low),
        task("4", Priority::Medium),
    ])
    .await;
    h.list.refresh().await.unwrap();

    h.list.sort_by(SortKey::Priority);
    assert_eq!(ids(&h.list.tasks()), vec!["1", "2", "4", "3"]);
    assert_eq!(h.store.calls().list, 1);

    h.list.invalidate();
    h.list.on_focus().await.unwrap();
    let snapshot = h.list.snapshot();
    assert_eq!(snapshot.sort_key, SortKey::None);
    assert_eq!(ids(&snapshot.tasks), vec!["1", "2", "3", "4"]);
}
