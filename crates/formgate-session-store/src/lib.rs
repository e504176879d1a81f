//! Formgate Session Store
//!
//! Provides the abstraction and implementations for the shared session
//! key-value store. The SessionStore trait defines a contract for reading
//! and writing session documents as opaque strings keyed by a transaction
//! or session identifier. The store owns expiry/eviction policy; this
//! crate never deletes keys.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during session store operations
#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("Storage backend error: {0}")]
    BackendError(#[from] anyhow::Error), // Catch-all for backend-specific issues

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Result type for SessionStore operations
pub type SessionStoreResult<T> = Result<T, SessionStoreError>;

/// Trait defining the contract for session store implementations
///
/// Payloads are JSON strings; the store treats them as opaque. Every write
/// is a blind overwrite of the full value for a key; there are no
/// transactions or conditional writes.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Check whether a key exists in the store
    async fn exists(&self, key: &str) -> SessionStoreResult<bool>;

    /// Retrieve the value for a key, or None if absent
    async fn get(&self, key: &str) -> SessionStoreResult<Option<String>>;

    /// Store a value under a key, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> SessionStoreResult<()>;

    /// Health check
    async fn health_check(&self) -> SessionStoreResult<bool> {
        // Default implementation that always returns true
        Ok(true)
    }
}

// Re-export modules so they can be used from other crates
pub mod memory;
#[cfg(feature = "redis-store")]
pub mod redis;

pub use memory::InMemorySessionStore;
