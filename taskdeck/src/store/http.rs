//! HTTP implementation of [`TaskStore`].
//!
//! Talks to the task service at a base URL fixed when the store is built:
//!
//! | Operation | Request |
//! |---|---|
//! | list | `GET {base}/tasks/{user}` |
//! | create | `POST {base}/tasks/{user}` with the full record |
//! | update | `PUT {base}/tasks/{user}/{id}` with the full record |
//! | delete | `DELETE {base}/tasks/{user}/{id}` |

use std::time::Duration;

use taskdeck_proto::wire::{self, TaskRecord};
use taskdeck_proto::{SessionIdentifier, Task, TaskId};
use url::Url;

use super::{TaskStore, TaskStoreError};

/// Task store backed by the remote task service.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTaskStore {
    /// Creates a store with no request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(base_url: Url) -> Result<Self, TaskStoreError> {
        Self::with_timeout(base_url, None)
    }

    /// Creates a store whose requests give up after `timeout`, if set.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn with_timeout(base_url: Url, timeout: Option<Duration>) -> Result<Self, TaskStoreError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// The base URL every request is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url, TaskStoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                TaskStoreError::Transport(format!("base URL cannot hold a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn collection_url(&self, user: &SessionIdentifier) -> Result<Url, TaskStoreError> {
        self.url(&["tasks", user.as_str()])
    }

    fn task_url(&self, user: &SessionIdentifier, task_id: &TaskId) -> Result<Url, TaskStoreError> {
        self.url(&["tasks", user.as_str(), task_id.as_str()])
    }
}

/// Turns a non-success response into [`TaskStoreError::Status`].
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, TaskStoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        body
    };
    Err(TaskStoreError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Reads a create/update response, falling back to what was sent when the
/// service answers with an empty body.
async fn stored_task(
    resp: reqwest::Response,
    task_id: &TaskId,
    sent: &Task,
) -> Result<Task, TaskStoreError> {
    let body = check_status(resp).await?.bytes().await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(sent.clone());
    }
    Ok(wire::decode_record(&body)?.into_task(task_id.clone()))
}

impl TaskStore for HttpTaskStore {
    async fn list(&self, user: &SessionIdentifier) -> Result<Vec<Task>, TaskStoreError> {
        let url = self.collection_url(user)?;
        tracing::debug!(%url, "GET task collection");
        let resp = self.client.get(url).send().await?;
        let body = check_status(resp).await?.bytes().await?;
        Ok(wire::decode_collection(&body)?)
    }

    async fn create(&self, user: &SessionIdentifier, task: &Task) -> Result<Task, TaskStoreError> {
        let url = self.collection_url(user)?;
        tracing::debug!(%url, task_id = %task.id, "POST task");
        let resp = self
            .client
            .post(url)
            .json(&TaskRecord::from_task(task))
            .send()
            .await?;
        stored_task(resp, &task.id, task).await
    }

    async fn update(
        &self,
        user: &SessionIdentifier,
        task_id: &TaskId,
        task: &Task,
    ) -> Result<Task, TaskStoreError> {
        let url = self.task_url(user, task_id)?;
        tracing::debug!(%url, "PUT task");
        let resp = self
            .client
            .put(url)
            .json(&TaskRecord::from_task(task))
            .send()
            .await?;
        stored_task(resp, task_id, task).await
    }

    async fn delete(&self, user: &SessionIdentifier, task_id: &TaskId) -> Result<(), TaskStoreError> {
        let url = self.task_url(user, task_id)?;
        tracing::debug!(%url, "DELETE task");
        let resp = self.client.delete(url).send().await?;
        check_status(resp).await?;
        Ok(())
    }
}
