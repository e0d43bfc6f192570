//! UseCase: メッセージ履歴の取得
//!
//! 履歴は新しい順です。`fetch_history_page` はページサイズより1件多く取得して
//! 続きがあるかどうかを判定します。

use crate::domain::{MeetingId, Message};

use super::{chat_service::MeetingChatService, error::ChatError};

/// 履歴の1ページ
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPageResult {
    pub messages: Vec<Message>,
    pub has_more: bool,
    /// 次のページの offset（`offset + messages.len()`）
    pub next_offset: usize,
}

impl MeetingChatService {
    /// ミーティングのメッセージを新しい順に取得（添付ファイル付き）
    pub async fn get_meeting_messages(
        &self,
        meeting_id: MeetingId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>, ChatError> {
        let mut messages = self
            .repositories
            .messages
            .list_by_meeting(meeting_id, limit, offset)
            .await?;

        for message in &mut messages {
            match self.repositories.attachments.list_by_message(message.id).await {
                Ok(attachments) => message.attachments = attachments,
                Err(e) => tracing::warn!(
                    "Failed to load attachments for message {}: {}",
                    message.id,
                    e
                ),
            }
        }
        Ok(messages)
    }

    /// 履歴の1ページを取得
    pub async fn fetch_history_page(
        &self,
        meeting_id: MeetingId,
        offset: usize,
        page_size: usize,
    ) -> Result<HistoryPageResult, ChatError> {
        let mut messages = self
            .get_meeting_messages(meeting_id, page_size.saturating_add(1), offset)
            .await?;

        let has_more = messages.len() > page_size;
        messages.truncate(page_size);
        let next_offset = offset + messages.len();

        Ok(HistoryPageResult {
            messages,
            has_more,
            next_offset,
        })
    }
}
