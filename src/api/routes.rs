//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing.

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check (high priority)
        .route("/health", get(health_handler))

        // Status endpoint
        .route("/status", get(status_handler))

        // Game action endpoint (the hot path)
        .route("/api/action", post(action_handler))

        // User record endpoints
        .route("/api/findUser", post(find_user_handler))
        .route("/api/createUser", post(create_user_handler))

        // Metrics endpoint for Prometheus
        .route("/metrics", get(metrics_handler))

        // Attach shared state
        .with_state(state)
}
