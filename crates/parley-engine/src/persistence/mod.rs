//! Best-effort local cache of the recent transcript.
//!
//! Every store mutation hands the last N messages to [`PersistenceWriter`],
//! which saves them under a fixed key off the conversation path. Storage
//! failures are logged and swallowed; they never reach the conversation.

mod file;
mod memory;
mod writer;

use std::path::PathBuf;
use std::sync::Arc;

use parley_common::StorageError;
use parley_config::schema::PersistenceConfig;
use tracing::{debug, warn};

use crate::store::Message;
use crate::Role;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use writer::PersistenceWriter;

/// Durable string key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn clear(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
    key: String,
    max_messages: usize,
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("key", &self.key)
            .field("max_messages", &self.max_messages)
            .finish_non_exhaustive()
    }
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, max_messages: usize) -> Self {
        Self {
            store,
            key: key.into(),
            max_messages,
        }
    }

    /// File-backed gateway, or `None` when persistence is switched off.
    pub fn from_config(config: &PersistenceConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let dir = if config.directory.is_empty() {
            FileStore::default_dir()?
        } else {
            PathBuf::from(&config.directory)
        };
        Some(Self::new(
            Arc::new(FileStore::new(dir)),
            config.storage_key.clone(),
            config.max_messages as usize,
        ))
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Write the most recent messages synchronously. Errors are logged,
    /// never returned. Sessions go through [`PersistenceWriter`] instead.
    pub fn save(&self, messages: &[Message]) {
        let start = messages.len().saturating_sub(self.max_messages);
        let result = serde_json::to_string(&messages[start..])
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(&self.key, &json));

        match result {
            Ok(()) => debug!(key = %self.key, count = messages.len() - start, "Transcript saved"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to persist transcript"),
        }
    }

    /// Read the stored transcript. Anything unreadable yields an empty list.
    ///
    /// A reply that was still streaming when it was saved can never finish,
    /// so it is restored as final, and an empty one is dropped.
    pub fn load(&self) -> Vec<Message> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read stored transcript");
                return Vec::new();
            }
        };

        let messages: Vec<Message> = match serde_json::from_str(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable stored transcript");
                return Vec::new();
            }
        };

        messages
            .into_iter()
            .filter(|m| !(m.is_streaming && m.role == Role::Assistant && m.content.is_empty()))
            .map(|mut m| {
                m.is_streaming = false;
                m
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.clear(&self.key) {
            warn!(key = %self.key, error = %e, "Failed to clear stored transcript");
        }
    }
}
