use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

// API Routes - REST API for programmatic access
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api",
        Router::new()
            // SQL generation and execution
            .route("/ask", post(handlers::api::ask_sql))
            .route("/run", post(handlers::api::run_sql))
            // System status
            .route("/status", get(handlers::api::system_status)),
    )
}
