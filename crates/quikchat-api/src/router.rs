//! Route definitions.

use axum::Router;
use axum::routing::{delete, get};

use crate::handlers::{events, health, ws};
use crate::state::AppState;

/// Builds the router with every QuikChat route.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route("/health/detailed", get(health::health_detailed))
        .route("/events", get(events::list_events))
        .route("/events/{id}", delete(events::acknowledge_event));

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/api", api)
        .with_state(state)
}
