//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::MessageEvent;

/// `GET /api/meetings/{meeting_id}/messages` のクエリ
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// `GET /api/meetings/{meeting_id}/messages` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageListDto {
    pub meeting_id: i64,
    pub messages: Vec<MessageEvent>,
    pub limit: usize,
    pub offset: usize,
}

/// `GET /debug/meetings/{meeting_id}/connections` の要素
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub connection_id: String,
    pub user_id: i64,
}
