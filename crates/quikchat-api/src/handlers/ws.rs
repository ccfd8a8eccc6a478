//! WebSocket upgrade handler.

use axum::Error as AxumError;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt, future};
use tracing::{info, warn};

use quikchat_core::types::AuthenticatedUser;
use quikchat_realtime::Frame;

use crate::extractors::WsAuth;
use crate::state::AppState;

/// GET /ws?token={jwt}: WebSocket upgrade
pub async fn ws_handler(
    State(state): State<AppState>,
    WsAuth(user): WsAuth,
    ws: WebSocketUpgrade,
) -> Response {
    let max_bytes = state.realtime.config().max_frame_bytes;

    ws.max_message_size(max_bytes)
        .max_frame_size(max_bytes)
        .on_upgrade(move |socket| handle_socket(state, user, socket))
}

/// Hands an upgraded socket to the engine until either side leaves.
async fn handle_socket(state: AppState, user: AuthenticatedUser, socket: WebSocket) {
    let user_id = user.user_id;
    info!(user_id = %user_id, "WebSocket connection established");

    let (sink, stream) = socket.split();
    let inbound = Box::pin(stream.filter_map(|message| future::ready(into_frame(message))));
    let outbound = Box::pin(
        sink.with(|frame: Frame| future::ready(Ok::<_, AxumError>(into_message(frame)))),
    );

    if let Err(e) = state.realtime.serve(user, inbound, outbound).await {
        warn!(user_id = %user_id, error = %e, "WebSocket session rejected");
    }
}

/// Binary frames are not part of the protocol and are dropped.
fn into_frame(message: Result<Message, AxumError>) -> Option<Result<Frame, AxumError>> {
    match message {
        Ok(Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
        Ok(Message::Ping(data)) => Some(Ok(Frame::Ping(data))),
        Ok(Message::Pong(data)) => Some(Ok(Frame::Pong(data))),
        Ok(Message::Close(_)) => Some(Ok(Frame::Close)),
        Ok(Message::Binary(_)) => None,
        Err(e) => Some(Err(e)),
    }
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Ping(data) => Message::Ping(data),
        Frame::Pong(data) => Message::Pong(data),
        Frame::Close => Message::Close(None),
    }
}
