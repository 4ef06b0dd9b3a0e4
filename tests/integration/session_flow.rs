//! Integration tests for session persistence and the screen flow.
//!
//! Uses the file-backed key/value store in a temp directory so a session
//! written by one `App` is seen by the next, as across process restarts.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use taskdeck::app::{App, Route};
use taskdeck::identity::{Credentials, IdentityError, IdentityService};
use taskdeck::session::file::FileKvStore;
use taskdeck::session::{KeyValueStore, SESSION_KEY, SessionCache};
use taskdeck::store::memory::MemoryTaskStore;
use taskdeck::tasks::FetchState;
use taskdeck_proto::{SessionIdentifier, Task, TaskId};

fn uid(raw: &str) -> SessionIdentifier {
    SessionIdentifier::new(raw).unwrap()
}

fn app_at(path: &Path, store: &Arc<MemoryTaskStore>) -> App<MemoryTaskStore, FileKvStore> {
    App::new(Arc::clone(store), SessionCache::new(FileKvStore::new(path)))
}

/// Provider that accepts a single account.
struct SingleAccount;

impl IdentityService for SingleAccount {
    async fn sign_in(&self, creds: &Credentials) -> Result<SessionIdentifier, IdentityError> {
        if creds.email == "ada@example.com" && creds.password == "analytical" {
            Ok(uid("ada-uid"))
        } else {
            Err(IdentityError::Provider {
                code: "auth/invalid-credential".to_string(),
            })
        }
    }

    async fn register(&self, _creds: &Credentials) -> Result<(), IdentityError> {
        Err(IdentityError::Provider {
            code: "auth/email-already-in-use".to_string(),
        })
    }
}

#[tokio::test]
async fn session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = Arc::new(MemoryTaskStore::new());
    store.seed(&uid("ada-uid"), vec![Task::new(TaskId::from("a"), "first")]);

    let mut first = app_at(&path, &store);
    assert_eq!(first.mount().await.unwrap(), &Route::Auth);
    first
        .login(&SingleAccount, &Credentials::new("ada@example.com", "analytical"))
        .await
        .unwrap();
    assert_eq!(first.route(), &Route::TaskList);
    drop(first);

    let mut second = app_at(&path, &store);
    assert_eq!(second.mount().await.unwrap(), &Route::TaskList);
    let snapshot = second.snapshot();
    assert_eq!(snapshot.identifier, Some(uid("ada-uid")));
    assert_eq!(snapshot.tasks.len(), 1);
}

#[tokio::test]
async fn logout_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");
    let store = Arc::new(MemoryTaskStore::new());

    let mut app = app_at(&path, &store);
    app.adopt_session(&uid("u1")).await.unwrap();
    app.logout().await.unwrap();
    assert_eq!(app.route(), &Route::Auth);

    let kv = FileKvStore::new(&path);
    assert_eq!(kv.get(SESSION_KEY).await.unwrap(), None);

    let mut restarted = app_at(&path, &store);
    assert_eq!(restarted.mount().await.unwrap(), &Route::Auth);
    assert_eq!(store.calls().list, 1);
}

#[tokio::test]
async fn rejected_login_stays_on_auth() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = Arc::new(MemoryTaskStore::new());
    let mut app = app_at(&path, &store);
    app.mount().await.unwrap();

    let err = app
        .login(&SingleAccount, &Credentials::new("ada@example.com", "wrong-pass"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials please register");
    assert_eq!(app.route(), &Route::Auth);
    assert!(!path.exists());
    assert_eq!(store.calls().total(), 0);
}

#[tokio::test]
async fn corrupt_session_file_routes_to_auth() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = Arc::new(MemoryTaskStore::new());

    let mut app = app_at(&path, &store);
    assert_eq!(app.mount().await.unwrap(), &Route::Auth);
    assert_eq!(app.snapshot().fetch_state, FetchState::Idle);
    assert_eq!(store.calls().total(), 0);
}

#[tokio::test]
async fn switching_users_drops_previous_view() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = Arc::new(MemoryTaskStore::new());
    store.seed(&uid("u1"), vec![Task::new(TaskId::from("a"), "mine")]);

    let mut app = app_at(&path, &store);
    app.adopt_session(&uid("u1")).await.unwrap();
    assert_eq!(app.snapshot().tasks.len(), 1);

    app.adopt_session(&uid("u2")).await.unwrap();
    let snapshot = app.snapshot();
    assert_eq!(snapshot.identifier, Some(uid("u2")));
    assert!(snapshot.tasks.is_empty());
    assert!(snapshot.is_empty_state());
}
