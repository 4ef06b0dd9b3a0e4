//! JSON wire format of the remote task service.
//!
//! The service stores one record per task under `/tasks/{user}` and returns
//! the collection as a JSON object mapping task id to record. Records use
//! the service's camelCase field names (`taskName`, `taskDate`, ...).
//! [`decode_collection`] turns a list response into an ordered `Vec<Task>`,
//! taking each task's id from the mapping key and keeping the server's key
//! order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::task::{Priority, Task, TaskId};

/// Errors decoding or encoding wire payloads.
#[derive(Debug, Error)]
pub enum WireError {
    /// The body was not valid JSON, or not a JSON object / `null`.
    #[error("malformed task collection: {0}")]
    Collection(#[source] serde_json::Error),
    /// A single record inside the collection could not be decoded.
    #[error("malformed task record {id}: {source}")]
    Record {
        /// Mapping key of the offending record.
        id: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// A single-record body could not be decoded or encoded.
    #[error("malformed task record: {0}")]
    Single(#[from] serde_json::Error),
}

/// One task as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, with = "task_date")]
    pub task_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_image: Option<String>,
}

impl TaskRecord {
    /// Builds the full record for a task, id included.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_name: task.name.clone(),
            task_id: Some(task.id.as_str().to_string()),
            task_date: task.due_date,
            task_desc: task.description.clone(),
            task_priority: task.priority,
            task_completed: task.completed,
            task_image: task.image_ref.clone(),
        }
    }

    /// Converts the record into a task with the given id.
    ///
    /// The id argument wins over any `taskId` carried in the body: the
    /// collection key is authoritative.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            name: self.task_name,
            description: self.task_desc,
            priority: self.task_priority,
            due_date: self.task_date,
            completed: self.task_completed,
            image_ref: self.task_image,
        }
    }
}

/// Decodes a list response body into tasks in mapping order.
///
/// An empty body, `null` or `{}` all yield an empty vector. A record that
/// does not decode is logged and skipped so the rest of the list still
/// shows.
///
/// # Errors
///
/// Returns [`WireError::Collection`] if the body is not a JSON object or
/// `null`.
pub fn decode_collection(body: &[u8]) -> Result<Vec<Task>, WireError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let mapping: Option<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_slice(body).map_err(WireError::Collection)?;

    Ok(mapping
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<TaskRecord>(value) {
            Ok(record) => Some(record.into_task(TaskId::from(key))),
            Err(source) => {
                let error = WireError::Record { id: key, source };
                tracing::warn!(%error, "skipping undecodable task record");
                None
            }
        })
        .collect())
}

/// Decodes a single-record body (create/update responses).
///
/// # Errors
///
/// Returns [`WireError::Single`] if the body is not a valid record.
pub fn decode_record(body: &[u8]) -> Result<TaskRecord, WireError> {
    Ok(serde_json::from_slice(body)?)
}

/// Encodes a list of records as the id-keyed mapping the service returns.
///
/// Records without a `taskId` are skipped.
///
/// # Errors
///
/// Returns [`WireError::Single`] if a record cannot be converted to JSON.
pub fn encode_collection<'a>(
    records: impl IntoIterator<Item = &'a TaskRecord>,
) -> Result<serde_json::Value, WireError> {
    let mut mapping = serde_json::Map::new();
    for record in records {
        if let Some(id) = &record.task_id {
            mapping.insert(id.clone(), serde_json::to_value(record)?);
        }
    }
    Ok(serde_json::Value::Object(mapping))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `taskDate` accepts RFC 3339 text, a naive timestamp with `T` or a space
/// separator (read as UTC), a bare date (midnight UTC), epoch milliseconds, `null` or an empty string. It is always written as
/// RFC 3339 or `null`.
mod task_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Millis(i64),
        Fractional(f64),
        Text(String),
    }

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<RawDate>::deserialize(deserializer)? else {
            return Ok(None);
        };
        match raw {
            RawDate::Millis(ms) => DateTime::from_timestamp_millis(ms)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("taskDate out of range: {ms}"))),
            #[allow(clippy::cast_possible_truncation)]
            RawDate::Fractional(ms) => DateTime::from_timestamp_millis(ms as i64)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("taskDate out of range: {ms}"))),
            RawDate::Text(text) => parse_text(&text).map_err(D::Error::custom),
        }
    }

    fn parse_text(text: &str) -> Result<Option<DateTime<Utc>>, String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if let Ok(date) = DateTime::parse_from_rfc3339(text) {
            return Ok(Some(date.with_timezone(&Utc)));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(Some(naive.and_utc()));
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(|day| Some(day.and_time(NaiveTime::MIN).and_utc()))
            .map_err(|e| format!("invalid taskDate {text:?}: {e}"))
    }
}
