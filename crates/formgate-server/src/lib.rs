//!
//! Formgate Server - form-serving and submission gateway
//!
//! Serves domain-specific HTML forms from a configuration catalog, merges
//! submitted form data into shared session documents, and notifies the
//! downstream workflow service. This module exports all the components of
//! the server.

// External dependencies
use std::path::Path;
use std::sync::Arc;

/// API module
pub mod api;

/// Form catalog module
pub mod catalog;

/// Configuration module
pub mod config;

/// Error module
pub mod error;

/// Downstream notifier module
pub mod notify;

/// Server module
pub mod server;

/// Session merge engine module
pub mod session;

/// Template rendering module
pub mod template;

// Re-export key types
pub use catalog::{FormCatalog, FormDefinition, RenderType};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use notify::{SubmissionIds, WorkflowNotifier};
pub use server::FormServer;
pub use session::{SessionDocument, SessionService, SubmissionReceipt};

use formgate_session_store::SessionStore;

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    // Initialize logging
    init_logging(&config);

    // Create dependencies
    let store = create_session_store(&config.session_store_url)?;
    let catalog = FormCatalog::load(Path::new(&config.catalog_path)).await?;

    // Create and run server
    let server = FormServer::new(config, catalog, store);
    server.run().await
}

/// Initialize logging
fn init_logging(config: &ServerConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    // Create filter based on config
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Initialize subscriber
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Create a session store client based on URL
pub fn create_session_store(url: &str) -> ServerResult<Arc<dyn SessionStore>> {
    if url.starts_with("memory://") {
        // Use in-memory session store for development and testing
        tracing::info!("Using in-memory session store");
        let store = formgate_session_store::InMemorySessionStore::new();
        return Ok(Arc::new(store));
    }
    #[cfg(feature = "redis")]
    if url.starts_with("redis://") {
        // Use Redis session store
        tracing::info!("Using Redis session store at {}", url);
        let store = formgate_session_store::redis::RedisSessionStore::new(url)
            .map_err(|e| ServerError::StoreError(e.to_string()))?;
        return Ok(Arc::new(store));
    }
    #[cfg(not(feature = "redis"))]
    if url.starts_with("redis://") {
        return Err(ServerError::ConfigError(
            "Redis session store requested but 'redis' feature not enabled".to_string(),
        ));
    }

    Err(ServerError::ConfigError(format!(
        "Unsupported session store URL: {}",
        url
    )))
}
