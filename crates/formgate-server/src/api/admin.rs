//! Admin API for catalog management

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::errors::ApiError;
use crate::server::FormServer;

/// Handler for rebuilding the form catalog from its document
///
/// The rebuilt catalog replaces the old one atomically; requests in flight
/// keep the snapshot they resolved against.
pub async fn reload_catalog_handler(State(server): State<Arc<FormServer>>) -> impl IntoResponse {
    info!("Catalog reload requested");

    match server.reload_catalog().await {
        Ok(forms) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "forms": forms,
            })),
        )
            .into_response(),
        Err(err) => {
            error!("Catalog reload failed: {}", err);
            ApiError::ReloadFailed.into_response()
        }
    }
}
