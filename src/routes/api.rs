use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::api;
use crate::state::AppState;
use std::sync::Arc;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(api::health_check))
        .route("/api/documents", post(api::create_document))
        .route("/api/documents/{id}", get(api::get_document))
        .route("/api/sessions", post(api::create_session))
        .route("/api/sessions/{id}/messages", get(api::session_messages))
        .layer(TraceLayer::new_for_http())
}
