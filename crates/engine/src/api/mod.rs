//! API layer - HTTP and WebSocket entry points.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::app::App;

pub mod connections;
pub mod http;
pub mod websocket;

#[cfg(test)]
mod http_flow_tests;
#[cfg(test)]
mod test_support;

pub use connections::{ConnectionManager, SharedConnectionManager};

/// Combined state for HTTP and WebSocket handlers.
pub struct ApiState {
    pub app: Arc<App>,
    pub connections: SharedConnectionManager,
}

impl ApiState {
    pub fn new(app: Arc<App>, connections: SharedConnectionManager) -> Arc<Self> {
        Arc::new(Self { app, connections })
    }
}

/// Full router: REST routes plus the `/ws` change feed.
pub fn router(state: Arc<ApiState>) -> Router {
    http::routes(state.app.config.max_upload_bytes)
        .route("/ws", get(websocket::ws_handler))
        .with_state(state)
}
