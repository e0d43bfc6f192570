//! WebSocket message DTOs.
//!
//! すべてのフレームは `{"type": ..., "data": ...}` の封筒（envelope）で送受信されます。
//! 受信側の封筒の解析は `codec` モジュールが担当し、ここでは `data` の形だけを定義します。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ========================================
// Inbound (client → server)
// ========================================

/// `message` の data
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessagePayload {
    pub room_id: i64,
    #[serde(default)]
    pub content: String,
    /// "text" / "file" / "system"（それ以外・省略時は text）
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub reply_to: Option<i64>,
    #[serde(default)]
    pub files: Vec<FileUpload>,
}

/// `message` に添付されるファイルのメタデータ
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileUpload {
    pub name: String,
    #[serde(rename = "type", default)]
    pub file_type: String,
    #[serde(default)]
    pub size: i64,
    pub url: String,
}

/// `reaction` の data
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReactionPayload {
    pub message_id: i64,
    pub emoji: String,
    /// "add" / "remove"
    pub action: String,
}

/// `typing` の data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TypingPayload {
    pub room_id: i64,
    pub is_typing: bool,
}

/// `history` の data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HistoryPayload {
    pub room_id: i64,
    /// 負の値は 0 として扱う
    #[serde(default)]
    pub offset: i64,
}

// ========================================
// Outbound (server → client)
// ========================================

/// 送信フレーム
///
/// `type` タグと `data` を持つ封筒としてシリアライズされます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum OutboundFrame {
    Room(RoomEvent),
    Message(MessageEvent),
    Reaction(ReactionEvent),
    Typing(TypingEvent),
    /// 要求した接続のみに返す
    History(HistoryPage),
    /// 要求した接続のみに返す
    Error(ErrorBody),
}

/// 送信者などの表示用ユーザー情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub id: i64,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomAction {
    Join,
    Leave,
}

/// 入室・退室の通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    pub room_id: i64,
    pub user_id: i64,
    pub action: RoomAction,
    pub timestamp: DateTime<Utc>,
    pub user: UserData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireMessageType {
    Text,
    File,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentData {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: i64,
    pub url: String,
}

/// 投稿されたメッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub id: i64,
    pub content: String,
    pub room_id: i64,
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: WireMessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<AttachmentData>,
    pub user: UserData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionEventAction {
    Added,
    Removed,
}

/// リアクションの追加・削除の通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub message_id: i64,
    pub user_id: i64,
    pub emoji: String,
    pub action: ReactionEventAction,
    pub timestamp: DateTime<Utc>,
    pub user: UserData,
}

/// 入力中状態の通知（永続化しない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingEvent {
    pub user_id: i64,
    pub room_id: i64,
    pub is_typing: bool,
    pub user: UserData,
}

/// 履歴の1ページ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub room_id: i64,
    pub messages: Vec<MessageEvent>,
    pub has_more: bool,
    /// 次のページの offset
    pub offset: usize,
}

/// エラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidFormat,
    UnknownType,
    InvalidMessageData,
    InvalidReactionData,
    InvalidTypingData,
    InvalidHistoryData,
    InvalidReactionAction,
    RoomMismatch,
    SendFailed,
    ReactionFailed,
    HistoryFailed,
    NotFound,
    Forbidden,
}

impl ErrorCode {
    /// クライアントに返す人間向けのメッセージ
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::InvalidFormat => "Invalid message format",
            ErrorCode::UnknownType => "Unknown message type",
            ErrorCode::InvalidMessageData => "Invalid message data",
            ErrorCode::InvalidReactionData => "Invalid reaction data",
            ErrorCode::InvalidTypingData => "Invalid typing data",
            ErrorCode::InvalidHistoryData => "Invalid history data",
            ErrorCode::InvalidReactionAction => "Invalid reaction action",
            ErrorCode::RoomMismatch => "Room ID mismatch",
            ErrorCode::SendFailed => "Failed to send message",
            ErrorCode::ReactionFailed => "Failed to handle reaction",
            ErrorCode::HistoryFailed => "Failed to get message history",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::Forbidden => "Not allowed in this meeting",
        }
    }
}

/// エラー応答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, details: impl Into<Option<String>>) -> Self {
        Self {
            code,
            message: code.description().to_string(),
            details: details.into(),
        }
    }
}
