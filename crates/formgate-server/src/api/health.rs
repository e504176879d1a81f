//! Health check endpoint for the Formgate Server

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::server::FormServer;

/// Health check handler
///
/// Reports basic server health plus the session store's status.
pub async fn health_check(State(server): State<Arc<FormServer>>) -> impl IntoResponse {
    info!("Health check requested");

    let store_status = match server.check_store_health().await {
        Ok(true) => "UP",
        Ok(false) => "DEGRADED",
        Err(_) => "DOWN",
    };

    let response = json!({
        "status": if store_status == "DOWN" { "DOWN" } else { "UP" },
        "version": env!("CARGO_PKG_VERSION"),
        "forms": server.catalog_forms(),
        "dependencies": {
            "sessionStore": {
                "status": store_status,
            },
        },
    });

    let overall_status = if store_status == "DOWN" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (overall_status, Json(response))
}
