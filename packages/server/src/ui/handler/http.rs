//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::MeetingId,
    infrastructure::dto::http::{ConnectionDto, MessageListDto, MessagesQuery},
    ui::{identity::Identity, presenter::message_events, state::AppState},
    usecase::ChatError,
};

const DEFAULT_PAGE_LIMIT: usize = 50;
const MAX_PAGE_LIMIT: usize = 100;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Messages of a meeting, newest first
pub async fn get_meeting_messages(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i64>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessageListDto>, StatusCode> {
    let meeting_id = MeetingId::new(meeting_id);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let service = &state.chat_service;
    let messages = service
        .get_meeting_messages(meeting_id, limit, offset)
        .await
        .map_err(|e| {
            tracing::warn!("Failed to list messages of meeting {}: {}", meeting_id, e);
            status_of(&e)
        })?;

    Ok(Json(MessageListDto {
        meeting_id: meeting_id.value(),
        messages: message_events(service, messages).await,
        limit,
        offset,
    }))
}

/// Record the caller as a participant of the meeting
pub async fn join_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i64>,
    identity: Identity,
) -> StatusCode {
    let meeting_id = MeetingId::new(meeting_id);
    match state
        .chat_service
        .join_meeting(meeting_id, identity.user_id())
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::warn!(
                "User {} failed to join meeting {}: {}",
                identity.user_id(),
                meeting_id,
                e
            );
            status_of(&e)
        }
    }
}

/// Remove the caller from the meeting's participants
pub async fn leave_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i64>,
    identity: Identity,
) -> StatusCode {
    let meeting_id = MeetingId::new(meeting_id);
    match state
        .chat_service
        .leave_meeting(meeting_id, identity.user_id())
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::warn!(
                "User {} failed to leave meeting {}: {}",
                identity.user_id(),
                meeting_id,
                e
            );
            status_of(&e)
        }
    }
}

/// Debug endpoint listing the live connections of a meeting
pub async fn debug_meeting_connections(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<i64>,
) -> Json<Vec<ConnectionDto>> {
    let members = state
        .chat_service
        .connections_of(MeetingId::new(meeting_id))
        .await;

    // Domain Model から DTO への変換
    let connections = members
        .into_iter()
        .map(|member| ConnectionDto {
            connection_id: member.connection_id.to_string(),
            user_id: member.user_id.value(),
        })
        .collect();
    Json(connections)
}

fn status_of(error: &ChatError) -> StatusCode {
    match error {
        ChatError::NotFound { .. } => StatusCode::NOT_FOUND,
        ChatError::Forbidden { .. } => StatusCode::FORBIDDEN,
        ChatError::Conflict(_) => StatusCode::CONFLICT,
        ChatError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
