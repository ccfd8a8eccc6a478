//! # quikchat-api
//!
//! HTTP API layer for QuikChat built on Axum.
//!
//! Provides the WebSocket upgrade that hands authenticated sockets to the
//! real-time engine, the event catch-up endpoints, health checks, CORS,
//! extractors, DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod probe;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
