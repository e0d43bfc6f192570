//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
};

use crate::{
    domain::MeetingId,
    ui::{connection::serve_connection, identity::Identity, state::AppState},
};

/// `GET /ws/meetings/{meeting_id}`
///
/// Upgrades the request and hands the socket to the connection lifecycle.
/// Joining the meeting happens after the upgrade so that a failure can be
/// reported with a close frame.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i64>,
    identity: Identity,
) -> impl IntoResponse {
    let meeting_id = MeetingId::new(meeting_id);
    let user_id = identity.user_id();
    tracing::info!(
        "WebSocket upgrade requested by user {} for meeting {}",
        user_id,
        meeting_id
    );

    ws.max_message_size(state.settings.max_message_size)
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade for meeting {} failed: {}", meeting_id, e);
        })
        .on_upgrade(move |socket| serve_connection(socket, state, meeting_id, user_id))
}
