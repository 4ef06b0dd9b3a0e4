//! Locally cached session identifier.
//!
//! [`SessionCache`] persists the signed-in user's [`SessionIdentifier`]
//! under the reserved key [`SESSION_KEY`] of a durable [`KeyValueStore`].
//! Concrete stores:
//! - [`file::FileKvStore`]: JSON document on disk, survives restarts
//! - [`memory::MemoryKvStore`]: in-process map for tests
//!
//! Reads never fail: a storage error while reading is logged and reported
//! as "no session", which routes the caller to the sign-in flow.

pub mod file;
pub mod memory;

use std::path::PathBuf;

use taskdeck_proto::SessionIdentifier;

/// The single reserved key holding the session identifier.
pub const SESSION_KEY: &str = "uid";

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The backing document exists but is not a valid key/value object.
    #[error("storage document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The store refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors writing the session identifier.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The underlying key/value store failed.
    #[error("session storage failed: {0}")]
    Storage(#[from] KvError),
}

/// Durable string key/value storage.
///
/// Last writer wins; implementations need not coordinate between processes.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, KvError>> + Send;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), KvError>> + Send;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl std::future::Future<Output = Result<(), KvError>> + Send;
}

/// Process-wide holder of the signed-in user's identifier.
///
/// Injected into the components that need it rather than read from global
/// state. Only the login and logout flows write to it.
pub struct SessionCache<K> {
    store: K,
}

impl<K: KeyValueStore> SessionCache<K> {
    /// Wraps a key/value store.
    pub const fn new(store: K) -> Self {
        Self { store }
    }

    /// Returns the cached identifier, or `None` when signed out.
    ///
    /// Storage errors and blank stored values degrade to `None`.
    pub async fn get(&self) -> Option<SessionIdentifier> {
        match self.store.get(SESSION_KEY).await {
            Ok(Some(raw)) => {
                let id = SessionIdentifier::new(raw);
                if id.is_none() {
                    tracing::warn!("stored session identifier is blank; treating as signed out");
                }
                id
            }
            Ok(None) => {
                tracing::debug!("no session identifier stored");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session identifier; treating as signed out");
                None
            }
        }
    }

    /// Stores the identifier handed out by a successful login.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the store rejects the write.
    pub async fn set(&self, id: &SessionIdentifier) -> Result<(), SessionError> {
        self.store.set(SESSION_KEY, id.as_str()).await?;
        tracing::info!(user = %id, "session identifier stored");
        Ok(())
    }

    /// Forgets the identifier (logout).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the store rejects the removal.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.store.remove(SESSION_KEY).await?;
        tracing::info!("session identifier cleared");
        Ok(())
    }

    /// The backing store.
    pub const fn store(&self) -> &K {
        &self.store
    }
}
