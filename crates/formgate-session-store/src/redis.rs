//! Redis implementation of SessionStore
//!
//! Session keys are used verbatim as Redis keys: the store is a single
//! flat namespace of transaction/session identifiers shared with the
//! upstream services that seed session documents.

use crate::{SessionStore, SessionStoreError, SessionStoreResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time;
use tracing::{debug, error, info};

const DEFAULT_POOL_SIZE: usize = 20;
const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 3000;
const DEFAULT_POOL_TIMEOUT_MS: u64 = 5000;

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Connection timeout in milliseconds
    pub connection_timeout_ms: u64,
    /// Pool timeout in milliseconds (waiting for an available connection)
    pub pool_timeout_ms: u64,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_POOL_SIZE,
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            pool_timeout_ms: DEFAULT_POOL_TIMEOUT_MS,
        }
    }
}

/// Redis implementation of SessionStore
#[derive(Debug)]
pub struct RedisSessionStore {
    /// Redis client
    client: Client,
    /// Semaphore bounding concurrent connections
    semaphore: Semaphore,
    /// Configuration
    config: RedisPoolConfig,
}

impl RedisSessionStore {
    /// Create a new Redis session store
    pub fn new(redis_url: &str) -> SessionStoreResult<Self> {
        Self::with_config(redis_url, RedisPoolConfig::default())
    }

    /// Create a new Redis session store with custom pool configuration
    pub fn with_config(redis_url: &str, config: RedisPoolConfig) -> SessionStoreResult<Self> {
        info!(
            "Creating new RedisSessionStore with URL: {}, pool_size: {}",
            redis_url, config.max_connections
        );

        let client = Client::open(redis_url).map_err(|e| {
            SessionStoreError::ConfigurationError(format!("Invalid Redis URL: {}", e))
        })?;

        Ok(Self {
            client,
            semaphore: Semaphore::new(config.max_connections),
            config,
        })
    }

    /// Get a connection, bounded by the pool semaphore and timeouts
    async fn get_connection(&self) -> SessionStoreResult<redis::aio::Connection> {
        let permit = match time::timeout(
            Duration::from_millis(self.config.pool_timeout_ms),
            self.semaphore.acquire(),
        )
        .await
        {
            Ok(Ok(permit)) => permit,
            Ok(Err(e)) => {
                return Err(SessionStoreError::Unexpected(format!(
                    "Redis semaphore error: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(SessionStoreError::Timeout(format!(
                    "Timed out waiting for Redis connection after {}ms",
                    self.config.pool_timeout_ms
                )))
            }
        };

        match time::timeout(
            Duration::from_millis(self.config.connection_timeout_ms),
            self.client.get_async_connection(),
        )
        .await
        {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => {
                drop(permit);
                Err(SessionStoreError::BackendError(anyhow::anyhow!(
                    "Redis connection error: {}",
                    e
                )))
            }
            Err(_) => {
                drop(permit);
                Err(SessionStoreError::Timeout(format!(
                    "Timed out establishing Redis connection after {}ms",
                    self.config.connection_timeout_ms
                )))
            }
        }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn exists(&self, key: &str) -> SessionStoreResult<bool> {
        let mut conn = self.get_connection().await?;

        let exists: bool = conn.exists(key).await.map_err(|e| {
            SessionStoreError::BackendError(anyhow::anyhow!("Redis exists error: {}", e))
        })?;

        Ok(exists)
    }

    async fn get(&self, key: &str) -> SessionStoreResult<Option<String>> {
        let mut conn = self.get_connection().await?;

        let value: Option<String> = conn.get(key).await.map_err(|e| {
            SessionStoreError::BackendError(anyhow::anyhow!("Redis get error: {}", e))
        })?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> SessionStoreResult<()> {
        let mut conn = self.get_connection().await?;

        let _: () = conn.set(key, value).await.map_err(|e| {
            SessionStoreError::BackendError(anyhow::anyhow!("Redis set error: {}", e))
        })?;

        debug!("Set Redis session key={}", key);
        Ok(())
    }

    async fn health_check(&self) -> SessionStoreResult<bool> {
        let mut conn = self.get_connection().await?;

        let ping: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis PING failed: {}", e);
                SessionStoreError::BackendError(anyhow::anyhow!("Redis ping error: {}", e))
            })?;

        Ok(ping == "PONG")
    }
}
