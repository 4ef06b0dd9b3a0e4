//! File-backed key/value store.
//!
//! All entries live in one JSON object on disk. Every write rewrites the
//! whole document to a sibling temp file and renames it into place, so a
//! crash mid-write leaves either the old or the new document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::{KeyValueStore, KvError};

type Document = BTreeMap<String, String>;

/// Key/value store persisted as a JSON object in a single file.
pub struct FileKvStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileKvStore {
    /// Creates a store at `path`. The file and its parent directories are
    /// created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Document, KvError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(Document::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn write_document(&self, doc: &Document) -> Result<(), KvError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| KvError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        let contents = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| KvError::Io {
                path: tmp.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> KvError {
        KvError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl KeyValueStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let doc = self.read_document().await?;
        Ok(doc.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_document().await?;
        doc.insert(key.to_string(), value.to_string());
        self.write_document(&doc).await
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_document().await?;
        if doc.remove(key).is_none() {
            return Ok(());
        }
        self.write_document(&doc).await
    }
}
