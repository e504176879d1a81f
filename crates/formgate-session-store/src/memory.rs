//! In-memory implementation of SessionStore
//!
//! This implementation is primarily intended for testing and development
//! purposes. All data is lost when the last handle is dropped.

use crate::{SessionStore, SessionStoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory implementation of SessionStore
///
/// Stores session payloads in a process-local map. Cloning the store clones
/// the handle, not the data, so all clones share the same map.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySessionStore {
    /// Create a new in-memory session store
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of keys currently stored
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no keys
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn exists(&self, key: &str) -> SessionStoreResult<bool> {
        let entries = self.entries.read().await;
        Ok(entries.contains_key(key))
    }

    async fn get(&self, key: &str) -> SessionStoreResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> SessionStoreResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        debug!("Set session store key={}", key);
        Ok(())
    }
}
