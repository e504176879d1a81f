//! Form rendering and submission handlers

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, warn};

use crate::api::errors::ApiError;
use crate::catalog::RenderType;
use crate::notify::SubmissionIds;
use crate::server::FormServer;

/// Submission identifiers carried in the query string
#[derive(Debug, Deserialize)]
pub struct SubmissionQuery {
    pub session_id: Option<String>,
    pub flow_id: Option<String>,
    pub transaction_id: Option<String>,
}

impl SubmissionQuery {
    /// All three identifiers, or the missing-identifiers failure
    ///
    /// Empty values count as missing, like absent parameters.
    fn require_ids(&self) -> Result<SubmissionIds, ApiError> {
        match (&self.session_id, &self.flow_id, &self.transaction_id) {
            (Some(session_id), Some(flow_id), Some(transaction_id))
                if !session_id.is_empty()
                    && !flow_id.is_empty()
                    && !transaction_id.is_empty() =>
            {
                Ok(SubmissionIds {
                    session_id: session_id.clone(),
                    flow_id: flow_id.clone(),
                    transaction_id: transaction_id.clone(),
                })
            }
            _ => Err(ApiError::MissingIdentifiers),
        }
    }
}

/// Handler for rendering a form
pub async fn get_form(
    State(server): State<Arc<FormServer>>,
    Path((domain, form_url)): Path<(String, String)>,
    Query(query): Query<SubmissionQuery>,
) -> Response {
    match server
        .render_form(
            &domain,
            &form_url,
            query.session_id.as_deref(),
            query.flow_id.as_deref(),
            query.transaction_id.as_deref(),
        )
        .await
    {
        Ok(rendered) => match rendered.render_type {
            RenderType::Dynamic => (
                [(header::CONTENT_TYPE, "application/html")],
                rendered.html,
            )
                .into_response(),
            RenderType::Static => Html(rendered.html).into_response(),
        },
        Err(err) => {
            warn!("Form render failed for {}/{}: {}", domain, form_url, err);
            ApiError::from(err).into_response()
        }
    }
}

/// Handler for processing a form submission
pub async fn submit_form(
    State(server): State<Arc<FormServer>>,
    Path((domain, form_url)): Path<(String, String)>,
    Query(query): Query<SubmissionQuery>,
    body: Option<Json<Value>>,
) -> Response {
    // Identifier validation happens before any catalog or store access
    let ids = match query.require_ids() {
        Ok(ids) => ids,
        Err(err) => return err.into_response(),
    };

    let form_data = body
        .map(|Json(fields)| fields)
        .unwrap_or_else(|| Value::Object(Default::default()));

    match server.submit_form(&domain, &form_url, &ids, form_data).await {
        Ok(submission_id) => Json(json!({
            "success": true,
            "submission_id": submission_id,
        }))
        .into_response(),
        Err(err) if err.is_not_found() => {
            warn!("Submission for unknown form {}/{}", domain, form_url);
            ApiError::FormNotFound.into_response()
        }
        Err(err) => {
            error!("Form submission error: {}", err);
            ApiError::SubmissionFailed.into_response()
        }
    }
}
