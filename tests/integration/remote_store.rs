//! Integration tests for the HTTP task store.
//!
//! Runs `HttpTaskStore` against the reference task service started
//! in-process on an ephemeral port.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use taskdeck::session::SessionCache;
use taskdeck::session::memory::MemoryKvStore;
use taskdeck::store::http::HttpTaskStore;
use taskdeck::store::{TaskStore, TaskStoreError};
use taskdeck::tasks::{MutationError, RefreshOutcome, TaskDraft, TaskListController, TaskMutationCoordinator};
use taskdeck_proto::wire::TaskRecord;
use taskdeck_proto::{Priority, SessionIdentifier, Task, TaskId};
use taskdeck_server::service::{self, ServiceState};
use url::Url;

/// Start the task service in-process and return a store pointed at it.
async fn start_service() -> (HttpTaskStore, Arc<ServiceState>) {
    let state = Arc::new(ServiceState::new());
    let (addr, _handle) = service::start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start task service");
    let base = Url::parse(&format!("http://{addr}")).unwrap();
    (HttpTaskStore::new(base).unwrap(), state)
}

fn uid(raw: &str) -> SessionIdentifier {
    SessionIdentifier::new(raw).unwrap()
}

fn full_task(id: &str) -> Task {
    Task {
        id: TaskId::from(id),
        name: "Renew passport".to_string(),
        description: "bring two photos".to_string(),
        priority: Priority::High,
        due_date: Some(Utc.with_ymd_and_hms(2024, 9, 30, 8, 0, 0).unwrap()),
        completed: false,
        image_ref: Some("file:///photos/passport.jpg".to_string()),
    }
}

// =============================================================================
// Store operations
// =============================================================================

#[tokio::test]
async fn unknown_user_has_empty_collection() {
    let (store, _state) = start_service().await;
    assert!(store.list(&uid("nobody")).await.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_takes_ids_from_mapping_keys() {
    let (store, state) = start_service().await;
    let record = TaskRecord {
        task_id: Some("a".to_string()),
        ..TaskRecord::from_task(&full_task("ignored"))
    };
    state.repo.insert("u1", record).await;

    let tasks = store.list(&uid("u1")).await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, TaskId::from("a"));
    let expected = Task {
        id: TaskId::from("a"),
        ..full_task("a")
    };
    assert_eq!(tasks[0], expected);
}

#[tokio::test]
async fn crud_round_trip_preserves_every_field() {
    let (store, _state) = start_service().await;
    let user = uid("u1");
    let task = full_task("t-1");

    let created = store.create(&user, &task).await.unwrap();
    assert_eq!(created, task);

    let mut edited = task.clone();
    edited.completed = true;
    edited.image_ref = None;
    let updated = store.update(&user, &task.id, &edited).await.unwrap();
    assert_eq!(updated, edited);
    assert_eq!(store.list(&user).await.unwrap(), vec![edited]);

    store.delete(&user, &task.id).await.unwrap();
    assert!(store.list(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_order_follows_insertion() {
    let (store, _state) = start_service().await;
    let user = uid("u1");
    for id in ["zeta", "alpha", "mid"] {
        store.create(&user, &Task::new(TaskId::from(id), id)).await.unwrap();
    }
    let ids: Vec<String> = store
        .list(&user)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id.to_string())
        .collect();
    assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
}

#[tokio::test]
async fn users_are_isolated_and_ids_are_percent_encoded() {
    let (store, _state) = start_service().await;
    let odd = uid("team/a b");
    store.create(&odd, &Task::new(TaskId::from("x"), "mine")).await.unwrap();

    assert_eq!(store.list(&odd).await.unwrap().len(), 1);
    assert!(store.list(&uid("team")).await.unwrap().is_empty());
}

#[tokio::test]
async fn service_rejections_surface_as_status_errors() {
    let (store, _state) = start_service().await;
    let user = uid("u1");
    let task = Task::new(TaskId::from("dup"), "once");
    store.create(&user, &task).await.unwrap();

    let err = store.create(&user, &task).await.unwrap_err();
    assert!(matches!(err, TaskStoreError::Status { status: 409, .. }));

    let err = store
        .update(&user, &TaskId::from("ghost"), &Task::new(TaskId::from("ghost"), "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskStoreError::Status { status: 404, .. }));

    // The store itself does not validate; the service still refuses.
    let err = store
        .create(&user, &Task::new(TaskId::from("blank"), "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskStoreError::Status { status: 400, .. }));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (store, _state) = start_service().await;
    store.delete(&uid("u1"), &TaskId::from("never-existed")).await.unwrap();
}

// =============================================================================
// Controller and coordinator over HTTP
// =============================================================================

#[tokio::test]
async fn add_then_focus_shows_server_copy() {
    let (store, _state) = start_service().await;
    let store = Arc::new(store);
    let session = SessionCache::new(MemoryKvStore::new());
    session.set(&uid("u1")).await.unwrap();

    let list = Arc::new(TaskListController::new(Arc::clone(&store)));
    list.initialize(&session).await;
    list.on_focus().await.unwrap();
    let mutations = TaskMutationCoordinator::new(Arc::clone(&store), Arc::clone(&list));

    let draft = TaskDraft {
        priority: Priority::Medium,
        ..TaskDraft::new("Call the plumber")
    };
    mutations.add(draft).await.unwrap();

    assert_eq!(list.on_focus().await.unwrap(), RefreshOutcome::Loaded { count: 1 });
    let shown = &list.tasks()[0];
    assert_eq!(shown.name, "Call the plumber");
    assert_eq!(shown.priority, Priority::Medium);
}

#[tokio::test]
async fn rejected_update_keeps_local_view() {
    let (store, state) = start_service().await;
    let store = Arc::new(store);
    store.create(&uid("u1"), &full_task("a")).await.unwrap();

    let session = SessionCache::new(MemoryKvStore::new());
    session.set(&uid("u1")).await.unwrap();
    let list = Arc::new(TaskListController::new(Arc::clone(&store)));
    list.initialize(&session).await;
    list.refresh().await.unwrap();
    let before = list.snapshot();

    // Removed behind the client's back, so the update gets a 404.
    assert!(state.repo.remove("u1", "a").await);
    let mutations = TaskMutationCoordinator::new(Arc::clone(&store), Arc::clone(&list));
    let err = mutations
        .update(&TaskId::from("a"), TaskDraft::from_task(&before.tasks[0]))
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::Remote(TaskStoreError::Status { status: 404, .. })));
    assert_eq!(list.snapshot(), before);
    assert!(!list.is_stale());
}
