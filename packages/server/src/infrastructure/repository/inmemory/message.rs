//! InMemory Message Repository 実装

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    MeetingId, Message, MessageId, MessageRepository, NewMessage, RepositoryError,
};

#[derive(Default)]
struct MessageTable {
    last_id: i64,
    rows: Vec<Message>,
}

/// インメモリ Message Repository 実装
///
/// 添付ファイルは保持しません（`attachments` は常に空で返します）。
#[derive(Default)]
pub struct InMemoryMessageRepository {
    table: Mutex<MessageTable>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create_message(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let mut table = self.table.lock().await;
        table.last_id += 1;
        let stored = Message {
            id: MessageId::new(table.last_id),
            parent_message_id: message.parent_message_id,
            content: message.content,
            kind: message.kind,
            meeting_id: message.meeting_id,
            sender_id: message.sender_id,
            is_edited: false,
            edited_at: None,
            created_at: message.created_at,
            attachments: Vec::new(),
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn get_message(&self, message_id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let table = self.table.lock().await;
        Ok(table.rows.iter().find(|m| m.id == message_id).cloned())
    }

    async fn list_by_meeting(
        &self,
        meeting_id: MeetingId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let table = self.table.lock().await;
        let mut rows: Vec<&Message> = table
            .rows
            .iter()
            .filter(|m| m.meeting_id == meeting_id)
            .collect();

        // 新しい順（同時刻は ID の降順）
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageKind, UserId};
    use chrono::{DateTime, Duration, Utc};

    fn new_message(meeting_id: i64, content: &str, created_at: DateTime<Utc>) -> NewMessage {
        NewMessage {
            parent_message_id: None,
            content: content.to_string(),
            kind: MessageKind::Text,
            meeting_id: MeetingId::new(meeting_id),
            sender_id: UserId::new(1),
            created_at,
        }
    }

    #[tokio::test]
    async fn test_create_message_assigns_sequential_ids() {
        // テスト項目: 保存したメッセージに連番の ID が振られ、取得できる
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();
        let now = Utc::now();

        // when (操作):
        let first = repo.create_message(new_message(7, "a", now)).await.unwrap();
        let second = repo.create_message(new_message(7, "b", now)).await.unwrap();

        // then (期待する結果):
        assert_eq!(first.id, MessageId::new(1));
        assert_eq!(second.id, MessageId::new(2));
        let fetched = repo.get_message(second.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "b");
        assert!(!fetched.is_edited);
    }

    #[tokio::test]
    async fn test_list_by_meeting_newest_first_with_paging() {
        // テスト項目: ミーティングのメッセージが新しい順に、offset/limit で取得できる
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();
        let base = Utc::now();
        for i in 0..5 {
            repo.create_message(new_message(7, &format!("m{i}"), base + Duration::seconds(i)))
                .await
                .unwrap();
        }
        repo.create_message(new_message(8, "other", base)).await.unwrap();

        // when (操作):
        let page = repo
            .list_by_meeting(MeetingId::new(7), 2, 1)
            .await
            .unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m2"]);
    }

    #[tokio::test]
    async fn test_list_by_meeting_breaks_timestamp_ties_by_id() {
        // テスト項目: 同時刻のメッセージは ID の降順で並ぶ
        // given (前提条件):
        let repo = InMemoryMessageRepository::new();
        let now = Utc::now();
        for content in ["first", "second", "third"] {
            repo.create_message(new_message(7, content, now)).await.unwrap();
        }

        // when (操作):
        let page = repo
            .list_by_meeting(MeetingId::new(7), 10, 0)
            .await
            .unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second", "first"]);
    }
}
