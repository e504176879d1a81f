//! API module for the Formgate Server
//!
//! This module contains the API routes and handlers for the Formgate Server.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod errors;
pub mod forms;
pub mod health;

use crate::server::FormServer;

/// Build the router for API endpoints
pub fn build_router(server: Arc<FormServer>) -> Router {
    Router::new()
        // Form rendering and submission
        .route("/forms/:domain/:form_url", get(forms::get_form))
        .route("/forms/:domain/:form_url/submit", post(forms::submit_form))
        // Catalog management
        .route("/v1/admin/catalog/reload", post(admin::reload_catalog_handler))
        // Health check
        .route("/health", get(health::health_check))
        // Request tracing
        .layer(TraceLayer::new_for_http())
        // Shared state
        .with_state(server)
}

// Re-export all modules for easier imports
pub use errors::ApiError;
