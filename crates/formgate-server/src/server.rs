//! Main Formgate Server implementation
//!
//! This module contains the FormServer implementation: catalog resolution,
//! form rendering and the submission pipeline (merge, then notify).

use serde_json::json;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::{CatalogHandle, FormCatalog, RenderType};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::notify::{SubmissionIds, WorkflowNotifier};
use crate::session::SessionService;
use crate::template::{self, RenderParams};
use formgate_session_store::SessionStore;

/// A rendered form plus its catalog-declared render type
#[derive(Debug)]
pub struct RenderedForm {
    pub html: String,
    pub render_type: RenderType,
}

/// Main server implementation
#[derive(Debug)]
pub struct FormServer {
    /// Configuration
    pub config: ServerConfig,

    /// Current form catalog
    catalog: CatalogHandle,

    /// Session merge engine
    sessions: SessionService,

    /// Downstream workflow notifier
    notifier: WorkflowNotifier,

    /// Session store handle
    store: Arc<dyn SessionStore>,
}

impl FormServer {
    /// Create a new FormServer
    pub fn new(
        config: ServerConfig,
        catalog: FormCatalog,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let catalog = CatalogHandle::new(catalog, PathBuf::from(&config.catalog_path));

        let sessions = if config.serialize_merges {
            SessionService::with_serialized_merges(store.clone())
        } else {
            SessionService::new(store.clone())
        };

        let notifier = WorkflowNotifier::new(config.mock_service_url.clone(), store.clone());

        Self {
            config,
            catalog,
            sessions,
            notifier,
            store,
        }
    }

    /// Run the server
    pub async fn run(self) -> ServerResult<()> {
        info!("Starting Formgate Server");

        let addr = format!("{}:{}", self.config.bind_address, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let addr = listener.local_addr()?;
        info!("Listening on {}", addr);

        // Build the API router
        let app = crate::api::build_router(Arc::new(self));

        // Run the server
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Resolve a form and render it with per-request submission metadata
    pub async fn render_form(
        &self,
        domain: &str,
        form_url: &str,
        session_id: Option<&str>,
        flow_id: Option<&str>,
        transaction_id: Option<&str>,
    ) -> ServerResult<RenderedForm> {
        let requested = format!("{}/{}", domain, form_url);
        let catalog = self.catalog.snapshot();
        let form = catalog
            .lookup(&requested)
            .ok_or_else(|| ServerError::NotFound("Form".to_string()))?;

        let action_url = if self.config.auto_inject_submission_url {
            format!(
                "{}/forms/{}/submit?flow_id={}&session_id={}&transaction_id={}",
                self.config.base_url,
                form.key,
                flow_id.unwrap_or_default(),
                session_id.unwrap_or_default(),
                transaction_id.unwrap_or_default(),
            )
        } else {
            String::new()
        };

        let submission_data = json!({
            "session_id": session_id,
            "transaction_id": transaction_id,
            "flow_id": flow_id,
        })
        .to_string();

        let html = template::render(
            &form.content,
            &RenderParams {
                action_url,
                submission_data,
            },
        );

        debug!("Rendered form {}", form.key);
        Ok(RenderedForm {
            html,
            render_type: form.render_type,
        })
    }

    /// Process a form submission: merge into the session, then notify
    ///
    /// Returns the generated submission id. A failure in either the merge
    /// or the notification aborts the pipeline and propagates.
    pub async fn submit_form(
        &self,
        domain: &str,
        form_url: &str,
        ids: &SubmissionIds,
        mut form_data: Value,
    ) -> ServerResult<String> {
        let requested = format!("{}/{}", domain, form_url);
        let catalog = self.catalog.snapshot();
        let form = catalog
            .lookup(&requested)
            .ok_or_else(|| ServerError::NotFound("Form".to_string()))?;

        info!("Updating session with form data for {}", form.key);
        let submission_id = Uuid::new_v4().to_string();
        if let Some(fields) = form_data.as_object_mut() {
            fields.insert("form_submission_id".to_string(), json!(submission_id));
        }

        self.sessions
            .merge_form_submission(&form.url, form_data, &ids.transaction_id)
            .await?;
        debug!("Session updated for transaction {}", ids.transaction_id);

        self.notifier.notify(domain, ids, &submission_id).await?;

        Ok(submission_id)
    }

    /// Rebuild the form catalog from its document
    pub async fn reload_catalog(&self) -> ServerResult<usize> {
        self.catalog.reload().await
    }

    /// Number of forms in the current catalog snapshot
    pub fn catalog_forms(&self) -> usize {
        self.catalog.snapshot().len()
    }

    /// Check the session store's health
    pub async fn check_store_health(&self) -> ServerResult<bool> {
        Ok(self.store.health_check().await?)
    }
}
