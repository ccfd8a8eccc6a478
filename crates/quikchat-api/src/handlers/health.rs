//! Health check handlers.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use futures::future::join_all;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/health/detailed
///
/// Answers 503 when any probe fails so load balancers can drain the node.
pub async fn health_detailed(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<DetailedHealthResponse>>) {
    let results = join_all(state.probes.iter().map(|probe| async move {
        (probe.name().to_string(), probe.check().await)
    }))
    .await;

    let healthy = results.iter().all(|(_, up)| *up);
    let checks: BTreeMap<String, String> = results
        .into_iter()
        .map(|(name, up)| (name, if up { "up" } else { "down" }.to_string()))
        .collect();

    let body = DetailedHealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        checks,
        online_users: state.realtime.online_count().await,
        metrics: state.realtime.metrics.snapshot(),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ApiResponse::ok(body)))
}
