//! UseCase: メッセージ送信処理
//!
//! ## 処理の流れ
//!
//! 1. 送信者がミーティングの参加者であることを確認（違えば何も保存しない）
//! 2. 返信先が指定されていれば、同じミーティングに存在することを確認
//! 3. メッセージを保存
//! 4. 添付ファイルを1件ずつ保存（失敗はログに残して次へ進む）
//! 5. 保存済みの添付ファイルを読み直して結果に含める
//!
//! 配信は呼び出し側（セッション）が行います。

use crate::domain::{
    Attachment, AttachmentUpload, MeetingId, Message, MessageId, MessageKind, NewAttachment,
    NewMessage, UserId,
};

use super::{chat_service::MeetingChatService, error::ChatError};

/// メッセージ送信の入力
#[derive(Debug, Clone, PartialEq)]
pub struct SendMessageCommand {
    pub meeting_id: MeetingId,
    pub sender_id: UserId,
    pub parent_message_id: Option<MessageId>,
    pub content: String,
    pub kind: MessageKind,
    pub attachments: Vec<AttachmentUpload>,
}

impl MeetingChatService {
    /// メッセージを保存し、配信用のメッセージを返す
    ///
    /// # Errors
    ///
    /// * `ChatError::Forbidden` - 送信者が参加者ではない
    /// * `ChatError::NotFound` - 返信先のメッセージが同じミーティングに存在しない
    /// * `ChatError::Repository` - メッセージの保存に失敗
    pub async fn send_message(&self, command: SendMessageCommand) -> Result<Message, ChatError> {
        let SendMessageCommand {
            meeting_id,
            sender_id,
            parent_message_id,
            content,
            kind,
            attachments,
        } = command;

        if !self
            .repositories
            .meetings
            .is_participant(meeting_id, sender_id)
            .await?
        {
            return Err(ChatError::Forbidden {
                meeting_id,
                user_id: sender_id,
            });
        }

        if let Some(parent_id) = parent_message_id {
            let parent = self.repositories.messages.get_message(parent_id).await?;
            if !parent.is_some_and(|p| p.meeting_id == meeting_id) {
                return Err(ChatError::NotFound {
                    resource: "message",
                    id: parent_id.value(),
                });
            }
        }

        let created_at = self.clock.now();
        let mut message = self
            .repositories
            .messages
            .create_message(NewMessage {
                parent_message_id,
                content,
                kind,
                meeting_id,
                sender_id,
                created_at,
            })
            .await?;

        if !attachments.is_empty() {
            message.attachments = self.store_attachments(&message, attachments).await;
        }

        tracing::debug!(
            "Message {} stored in meeting {} by user {} ({} attachment(s))",
            message.id,
            meeting_id,
            sender_id,
            message.attachments.len()
        );
        Ok(message)
    }

    async fn store_attachments(
        &self,
        message: &Message,
        uploads: Vec<AttachmentUpload>,
    ) -> Vec<Attachment> {
        let attachments = &self.repositories.attachments;
        let mut stored = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let file_name = upload.file_name.clone();
            let result = attachments
                .create_attachment(NewAttachment {
                    message_id: message.id,
                    uploader_id: message.sender_id,
                    upload,
                    created_at: message.created_at,
                })
                .await;
            match result {
                Ok(attachment) => stored.push(attachment),
                Err(e) => tracing::warn!(
                    "Failed to store attachment '{}' for message {}: {}",
                    file_name,
                    message.id,
                    e
                ),
            }
        }

        match attachments.list_by_message(message.id).await {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!(
                    "Failed to reload attachments for message {}: {}",
                    message.id,
                    e
                );
                stored
            }
        }
    }
}
