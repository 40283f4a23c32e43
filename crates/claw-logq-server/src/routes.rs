//! Route configuration for the log API.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers::{health_check, list_files, purge_logs, retrieve_logs};
use crate::middleware::transaction_id;
use crate::state::AppState;

/// Create the log API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let endpoint = state.config().endpoint.clone();

    Router::new()
        .route("/health", get(health_check))
        .route(&endpoint, post(retrieve_logs).delete(purge_logs))
        .route(&format!("{endpoint}/files"), get(list_files))
        .layer(from_fn_with_state(Arc::clone(&state), transaction_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
