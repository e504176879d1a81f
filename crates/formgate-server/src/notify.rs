//! Downstream workflow notifier
//!
//! After a submission is merged into the session, the workflow (mock)
//! service is told to proceed. The target URL is derived from the
//! `domain`/`version` metadata stored in the session document by the
//! upstream process; a loopback mock service omits the version segment.

use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{ServerError, ServerResult};
use formgate_session_store::SessionStore;

/// Timeout for the outbound workflow call
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Identifiers accompanying a form submission
#[derive(Debug, Clone)]
pub struct SubmissionIds {
    pub session_id: String,
    pub flow_id: String,
    pub transaction_id: String,
}

/// Posts submission events to the downstream workflow service
#[derive(Debug, Clone)]
pub struct WorkflowNotifier {
    /// HTTP client
    client: Client,

    /// Base URL of the workflow (mock) service
    mock_service_url: String,

    /// Session store holding the domain/version metadata
    store: Arc<dyn SessionStore>,
}

impl WorkflowNotifier {
    /// Create a new WorkflowNotifier
    pub fn new(mock_service_url: String, store: Arc<dyn SessionStore>) -> Self {
        let client = Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            mock_service_url: mock_service_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    /// Whether the configured mock service runs on a local loopback host
    fn is_loopback(&self) -> bool {
        self.mock_service_url.contains("localhost")
            || self.mock_service_url.contains("127.0.0.1")
    }

    /// Read the domain/version metadata from an established session
    async fn session_metadata(&self, session_id: &str) -> ServerResult<(String, String)> {
        let raw = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| ServerError::SessionNotFound(session_id.to_string()))?;
        let document: Value = serde_json::from_str(&raw)?;

        let domain = document
            .get("domain")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let version = document
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if domain.is_empty() {
            warn!("Session {} has no domain metadata", session_id);
        }

        Ok((domain, version))
    }

    /// Build the target URL for a workflow operation
    pub async fn build_target_url(&self, operation: &str, session_id: &str) -> ServerResult<String> {
        let (domain, version) = self.session_metadata(session_id).await?;

        let url = if self.is_loopback() {
            info!("Mock service is running on localhost");
            format!("{}/{}/{}", self.mock_service_url, domain, operation)
        } else {
            format!("{}/{}/{}/{}", self.mock_service_url, domain, version, operation)
        };

        debug!("Generated mock service url: {}", url);
        Ok(url)
    }

    /// Post a submission event to the workflow service
    ///
    /// Any transport failure or non-2xx response propagates as a
    /// notification error; the dispatcher treats it as a submission failure.
    pub async fn notify(
        &self,
        domain: &str,
        ids: &SubmissionIds,
        submission_id: &str,
    ) -> ServerResult<()> {
        let url = self.build_target_url("flows/proceed", &ids.session_id).await?;

        let payload = json!({
            "session_id": ids.session_id,
            "flow_id": ids.flow_id,
            "transaction_id": ids.transaction_id,
            "inputs": {
                "submission_id": submission_id,
            },
            "json_path_changes": {},
        });

        debug!(
            "Calling mock service for domain {} submission {} at {}",
            domain, submission_id, url
        );

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Mock service returned {}: {}", status, body);
            return Err(ServerError::NotificationError(format!(
                "Mock service returned status {}",
                status
            )));
        }

        Ok(())
    }
}
