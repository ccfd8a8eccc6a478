//! Catch-up reads and acknowledgement of undelivered events.
//!
//! A client that reconnects gets a replay over the socket, but it can also
//! page through everything still pending here and confirm events one by one.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use quikchat_core::error::AppError;
use quikchat_core::types::EventId;

use crate::dto::request::EventsQuery;
use crate::dto::response::{ApiResponse, EventPage};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/events?cursor=&limit=
pub async fn list_events(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<EventsQuery>,
) -> Result<Json<ApiResponse<EventPage>>, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let events = state
        .events
        .fetch_undelivered(user.user_id, query.cursor, query.limit)
        .await?;

    Ok(Json(ApiResponse::ok(EventPage::new(events, query.limit))))
}

/// DELETE /api/events/{id}
///
/// Removes a delivered event from the buffer and the durable store.
pub async fn acknowledge_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .events
        .acknowledge(user.user_id, EventId::from_uuid(id))
        .await?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("Event {id} not found")).into())
    }
}
