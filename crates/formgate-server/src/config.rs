//! Configuration for the Formgate Server
//!
//! This module contains the configuration types and loading functionality.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// Base URL used when building submission callback links into rendered forms
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whether rendered forms get the submission URL injected automatically
    #[serde(default = "default_auto_inject")]
    pub auto_inject_submission_url: bool,

    /// Base URL of the downstream workflow (mock) service
    pub mock_service_url: String,

    /// URL of the shared session store
    #[serde(default = "default_session_store_url")]
    pub session_store_url: String,

    /// Path to the form catalog document
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Serialize session merges per transaction id (opt-in upgrade over the
    /// default last-writer-wins read-modify-write)
    #[serde(default)]
    pub serialize_merges: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    3001
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_auto_inject() -> bool {
    true
}

fn default_session_store_url() -> String {
    "memory://local".to_string()
}

fn default_catalog_path() -> String {
    "config/forms.yaml".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn load() -> ServerResult<Self> {
        // Start with defaults
        let mut config = Self::default();

        // Override from environment variables
        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.port = port;
            } else {
                warn!("Invalid PORT value: {}", port);
            }
        }

        if let Ok(host) = env::var("SERVER_HOST") {
            config.bind_address = host;
        }

        if let Ok(base_url) = env::var("BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(auto_inject) = env::var("AUTO_INJECT_SUBMISSION_URL") {
            config.auto_inject_submission_url =
                auto_inject.to_lowercase() == "true" || auto_inject == "1";
        }

        if let Ok(mock_service_url) = env::var("MOCK_SERVICE_URL") {
            config.mock_service_url = mock_service_url;
        }

        if let Ok(session_store_url) = env::var("SESSION_STORE_URL") {
            config.session_store_url = session_store_url;
        }

        if let Ok(catalog_path) = env::var("FORM_CONFIG_PATH") {
            config.catalog_path = catalog_path;
        }

        if let Ok(serialize_merges) = env::var("SERIALIZE_MERGES") {
            config.serialize_merges =
                serialize_merges.to_lowercase() == "true" || serialize_merges == "1";
        }

        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.log_level = log_level;
        }

        // Validate required fields
        if config.mock_service_url.is_empty() {
            return Err(ServerError::ConfigError(
                "Mock service URL is required".to_string(),
            ));
        }

        if config.base_url.ends_with('/') {
            // Trailing slash would produce double slashes in injected submission URLs
            config.base_url.truncate(config.base_url.len() - 1);
        }

        info!("Loaded server configuration");
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            base_url: default_base_url(),
            auto_inject_submission_url: default_auto_inject(),
            mock_service_url: String::new(),
            session_store_url: default_session_store_url(),
            catalog_path: default_catalog_path(),
            serialize_merges: false,
            log_level: default_log_level(),
        }
    }
}
