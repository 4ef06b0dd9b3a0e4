//! HTTP task service: shared state, route handlers and server startup.
//!
//! Routes, per user `u`:
//!
//! | Method | Path | Behavior |
//! |---|---|---|
//! | GET | `/tasks/{u}` | id-keyed mapping of the user's tasks (`{}` if none) |
//! | POST | `/tasks/{u}` | create; assigns an id if the body has none |
//! | PUT | `/tasks/{u}/{id}` | full replace of an existing task |
//! | DELETE | `/tasks/{u}/{id}` | idempotent removal |

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use taskdeck_proto::task::{TaskId, validate_name};
use taskdeck_proto::wire::{TaskRecord, encode_collection};

use crate::store::{TaskRepository, WriteOutcome};

/// Default maximum accepted request body size in bytes (64 KB).
const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Shared service state holding the task repository.
pub struct ServiceState {
    /// Per-user task collections.
    pub repo: TaskRepository,
    max_body_size: usize,
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceState {
    /// Creates a service with an empty repository and default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            repo: TaskRepository::new(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Creates a service with a custom body size limit and repository.
    #[must_use]
    pub const fn with_config(max_body_size: usize, repo: TaskRepository) -> Self {
        Self {
            repo,
            max_body_size,
        }
    }
}

/// Builds the service router over the given state.
pub fn router(state: Arc<ServiceState>) -> Router {
    let limit = state.max_body_size;
    Router::new()
        .route("/tasks/{user}", get(list_tasks).post(create_task))
        .route(
            "/tasks/{user}/{task_id}",
            put(update_task).delete(delete_task),
        )
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

async fn list_tasks(State(state): State<Arc<ServiceState>>, Path(user): Path<String>) -> Response {
    let records = state.repo.list(&user).await;
    tracing::debug!(user = %user, count = records.len(), "listing tasks");
    match encode_collection(&records) {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::error!(user = %user, error = %e, "failed to encode collection");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn create_task(
    State(state): State<Arc<ServiceState>>,
    Path(user): Path<String>,
    Json(mut record): Json<TaskRecord>,
) -> Response {
    if let Err(e) = validate_name(&record.task_name) {
        tracing::info!(user = %user, error = %e, "rejected create");
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }
    let task_id = record
        .task_id
        .get_or_insert_with(|| TaskId::generate().to_string())
        .clone();
    let outcome = state.repo.insert(&user, record).await;
    tracing::info!(user = %user, task_id = %task_id, ?outcome, "create");
    write_response(outcome, StatusCode::CREATED, &task_id)
}

async fn update_task(
    State(state): State<Arc<ServiceState>>,
    Path((user, task_id)): Path<(String, String)>,
    Json(record): Json<TaskRecord>,
) -> Response {
    if let Err(e) = validate_name(&record.task_name) {
        tracing::info!(user = %user, task_id = %task_id, error = %e, "rejected update");
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }
    let outcome = state.repo.replace(&user, &task_id, record).await;
    tracing::info!(user = %user, task_id = %task_id, ?outcome, "update");
    write_response(outcome, StatusCode::OK, &task_id)
}

async fn delete_task(
    State(state): State<Arc<ServiceState>>,
    Path((user, task_id)): Path<(String, String)>,
) -> StatusCode {
    let existed = state.repo.remove(&user, &task_id).await;
    tracing::info!(user = %user, task_id = %task_id, existed, "delete");
    StatusCode::NO_CONTENT
}

fn write_response(outcome: WriteOutcome, success: StatusCode, task_id: &str) -> Response {
    match outcome {
        WriteOutcome::Stored(record) => (success, Json(record)).into_response(),
        WriteOutcome::AlreadyExists => (
            StatusCode::CONFLICT,
            format!("task {task_id} already exists"),
        )
            .into_response(),
        WriteOutcome::NotFound => {
            (StatusCode::NOT_FOUND, format!("task {task_id} not found")).into_response()
        }
    }
}

/// Starts the service on `addr` with a fresh, empty state.
///
/// Returns the bound address (useful with port `0`) and the server task.
///
/// # Errors
///
/// Returns an error if the listener cannot bind.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(ServiceState::new())).await
}

/// Starts the service on `addr` over an existing state.
///
/// # Errors
///
/// Returns an error if the listener cannot bind.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<ServiceState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task service error");
        }
    });

    Ok((bound_addr, handle))
}
