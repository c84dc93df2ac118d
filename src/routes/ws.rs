use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::ws;
use crate::state::AppState;
use std::sync::Arc;

/// The voice endpoint carries no authentication of its own; deployments are
/// expected to front it with a reverse proxy. Session identity arrives in the
/// first `connection_init` message.
pub fn create_ws_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/voice", get(ws::ws_voice_handler))
        .layer(TraceLayer::new_for_http())
}
