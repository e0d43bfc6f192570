//! エンティティ
//!
//! チャットコアが読み書きする永続化エンティティと、
//! その作成に使う入力型を定義します。

use chrono::{DateTime, Utc};

use super::value_object::{AttachmentId, Emoji, MeetingId, MessageId, ReactionId, UserId};

/// ミーティング
///
/// ミーティング管理側（外部コラボレーター）が作成します。
/// チャットコアは存在確認と参加者集合の更新のみ行います。
#[derive(Debug, Clone, PartialEq)]
pub struct Meeting {
    pub id: MeetingId,
    pub name: String,
    pub channel_id: i64,
    pub creator_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// ミーティング参加者（meeting_id, user_id は一意）
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub meeting_id: MeetingId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

/// メッセージ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageKind {
    #[default]
    Text,
    FileShare,
    System,
}

/// メッセージ
///
/// 添付ファイルは別エンティティで、表示用に `attachments` へ結合されます。
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub parent_message_id: Option<MessageId>,
    pub content: String,
    pub kind: MessageKind,
    pub meeting_id: MeetingId,
    pub sender_id: UserId,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
}

/// 新規メッセージ（ID 採番前）
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub parent_message_id: Option<MessageId>,
    pub content: String,
    pub kind: MessageKind,
    pub meeting_id: MeetingId,
    pub sender_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// 添付ファイル
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub message_id: MessageId,
    pub uploader_id: UserId,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// クライアントから送られる添付ファイルのメタデータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub url: String,
}

/// 新規添付ファイル（ID 採番前）
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttachment {
    pub message_id: MessageId,
    pub uploader_id: UserId,
    pub upload: AttachmentUpload,
    pub created_at: DateTime<Utc>,
}

/// リアクション（message_id, user_id, emoji は一意）
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub id: ReactionId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: Emoji,
    pub created_at: DateTime<Utc>,
}

/// 新規リアクション（ID 採番前）
#[derive(Debug, Clone, PartialEq)]
pub struct NewReaction {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: Emoji,
    pub created_at: DateTime<Utc>,
}

/// リアクションの変化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionAction {
    Added,
    Removed,
}

/// ブロードキャスト用のリアクション変更内容
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionChange {
    pub meeting_id: MeetingId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: Emoji,
    pub action: ReactionAction,
    pub occurred_at: DateTime<Utc>,
}

/// ユーザー（表示用フィールドのみ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl User {
    /// 表示名を解決できなかったユーザー
    pub fn unresolved(id: UserId) -> Self {
        Self {
            id,
            name: String::new(),
            username: String::new(),
            avatar_url: None,
        }
    }
}
