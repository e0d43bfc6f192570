//! Conversion logic between DTOs and domain entities.

use chrono::{DateTime, Utc};

use crate::domain::{
    Attachment, AttachmentUpload, MeetingId, Message, MessageKind, ReactionAction,
    ReactionChange, User,
};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::FileUpload> for AttachmentUpload {
    fn from(file: dto::FileUpload) -> Self {
        Self {
            file_name: file.name,
            file_type: file.file_type,
            file_size: file.size,
            url: file.url,
        }
    }
}

/// メッセージ種別の解釈（未知の値は text 扱い）
pub fn message_kind_from_wire(kind: Option<&str>) -> MessageKind {
    match kind {
        Some("file") => MessageKind::FileShare,
        Some("system") => MessageKind::System,
        _ => MessageKind::Text,
    }
}

impl dto::ReactionPayload {
    /// "add" / "remove" 以外は `None`
    pub fn requested_action(&self) -> Option<ReactionAction> {
        match self.action.as_str() {
            "add" => Some(ReactionAction::Added),
            "remove" => Some(ReactionAction::Removed),
            _ => None,
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<MessageKind> for dto::WireMessageType {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Text => dto::WireMessageType::Text,
            MessageKind::FileShare => dto::WireMessageType::File,
            MessageKind::System => dto::WireMessageType::System,
        }
    }
}

impl From<ReactionAction> for dto::ReactionEventAction {
    fn from(action: ReactionAction) -> Self {
        match action {
            ReactionAction::Added => dto::ReactionEventAction::Added,
            ReactionAction::Removed => dto::ReactionEventAction::Removed,
        }
    }
}

impl From<User> for dto::UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id.value(),
            name: user.name,
            username: user.username,
            avatar: user.avatar_url,
        }
    }
}

impl From<Attachment> for dto::AttachmentData {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id.value(),
            name: attachment.file_name,
            file_type: attachment.file_type,
            size: attachment.file_size,
            url: attachment.url,
        }
    }
}

impl dto::MessageEvent {
    /// 送信者の表示情報を付けてメッセージを変換
    pub fn from_domain(message: Message, sender: User) -> Self {
        Self {
            id: message.id.value(),
            content: message.content,
            room_id: message.meeting_id.value(),
            user_id: message.sender_id.value(),
            timestamp: message.created_at,
            kind: message.kind.into(),
            reply_to: message.parent_message_id.map(|id| id.value()),
            files: message.attachments.into_iter().map(Into::into).collect(),
            user: sender.into(),
        }
    }
}

impl dto::ReactionEvent {
    pub fn from_domain(change: ReactionChange, user: User) -> Self {
        Self {
            message_id: change.message_id.value(),
            user_id: change.user_id.value(),
            emoji: change.emoji.into_string(),
            action: change.action.into(),
            timestamp: change.occurred_at,
            user: user.into(),
        }
    }
}

impl dto::RoomEvent {
    pub fn new(
        meeting_id: MeetingId,
        user: User,
        action: dto::RoomAction,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            room_id: meeting_id.value(),
            user_id: user.id.value(),
            action,
            timestamp,
            user: user.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttachmentId, Emoji, MessageId, UserId};

    fn bob() -> User {
        User {
            id: UserId::new(2),
            name: "Bob".to_string(),
            username: "bob".to_string(),
            avatar_url: Some("https://cdn.example.com/bob.png".to_string()),
        }
    }

    #[test]
    fn test_message_kind_from_wire() {
        // テスト項目: file / system 以外（省略を含む）は text として扱われる
        assert_eq!(message_kind_from_wire(Some("file")), MessageKind::FileShare);
        assert_eq!(message_kind_from_wire(Some("system")), MessageKind::System);
        assert_eq!(message_kind_from_wire(Some("text")), MessageKind::Text);
        assert_eq!(message_kind_from_wire(Some("video")), MessageKind::Text);
        assert_eq!(message_kind_from_wire(None), MessageKind::Text);
    }

    #[test]
    fn test_requested_action() {
        // テスト項目: reaction の action は add / remove のみ受け付ける
        let payload = |action: &str| dto::ReactionPayload {
            message_id: 1,
            emoji: "👍".to_string(),
            action: action.to_string(),
        };

        assert_eq!(payload("add").requested_action(), Some(ReactionAction::Added));
        assert_eq!(payload("remove").requested_action(), Some(ReactionAction::Removed));
        assert_eq!(payload("toggle").requested_action(), None);
    }

    #[test]
    fn test_message_event_from_domain() {
        // テスト項目: メッセージが添付ファイル・返信先・送信者情報付きで DTO に変換される
        // given (前提条件):
        let created_at = Utc::now();
        let message = Message {
            id: MessageId::new(10),
            parent_message_id: Some(MessageId::new(9)),
            content: "see attached".to_string(),
            kind: MessageKind::FileShare,
            meeting_id: MeetingId::new(7),
            sender_id: UserId::new(2),
            is_edited: false,
            edited_at: None,
            created_at,
            attachments: vec![Attachment {
                id: AttachmentId::new(1),
                message_id: MessageId::new(10),
                uploader_id: UserId::new(2),
                file_name: "plan.pdf".to_string(),
                file_type: "application/pdf".to_string(),
                file_size: 4096,
                url: "https://files.example.com/plan.pdf".to_string(),
                created_at,
            }],
        };

        // when (操作):
        let event = dto::MessageEvent::from_domain(message, bob());

        // then (期待する結果):
        assert_eq!(event.id, 10);
        assert_eq!(event.room_id, 7);
        assert_eq!(event.user_id, 2);
        assert_eq!(event.kind, dto::WireMessageType::File);
        assert_eq!(event.reply_to, Some(9));
        assert_eq!(event.files.len(), 1);
        assert_eq!(event.files[0].name, "plan.pdf");
        assert_eq!(event.user.username, "bob");
        assert_eq!(
            event.user.avatar.as_deref(),
            Some("https://cdn.example.com/bob.png")
        );
    }

    #[test]
    fn test_reaction_event_from_domain() {
        // テスト項目: リアクション変更が added / removed の DTO に変換される
        // given (前提条件):
        let change = ReactionChange {
            meeting_id: MeetingId::new(7),
            message_id: MessageId::new(10),
            user_id: UserId::new(2),
            emoji: Emoji::new("🎉".to_string()).unwrap(),
            action: ReactionAction::Removed,
            occurred_at: Utc::now(),
        };

        // when (操作):
        let event = dto::ReactionEvent::from_domain(change, bob());

        // then (期待する結果):
        assert_eq!(event.emoji, "🎉");
        assert_eq!(event.action, dto::ReactionEventAction::Removed);
        assert_eq!(event.user.id, 2);
    }
}
