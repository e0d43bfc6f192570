//! InMemory Reaction Repository 実装
//!
//! (message_id, user_id, emoji) の一意制約を再現します。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Emoji, MessageId, NewReaction, Reaction, ReactionId, ReactionRepository, RepositoryError,
    UserId,
};

#[derive(Default)]
struct ReactionTable {
    last_id: i64,
    rows: Vec<Reaction>,
}

impl ReactionTable {
    fn position(&self, message_id: MessageId, user_id: UserId, emoji: &Emoji) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| r.message_id == message_id && r.user_id == user_id && &r.emoji == emoji)
    }
}

/// インメモリ Reaction Repository 実装
#[derive(Default)]
pub struct InMemoryReactionRepository {
    table: Mutex<ReactionTable>,
}

impl InMemoryReactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReactionRepository for InMemoryReactionRepository {
    async fn create_reaction(&self, reaction: NewReaction) -> Result<Reaction, RepositoryError> {
        let mut table = self.table.lock().await;
        if table
            .position(reaction.message_id, reaction.user_id, &reaction.emoji)
            .is_some()
        {
            return Err(RepositoryError::Conflict(format!(
                "reaction {} by user {} on message {} already exists",
                reaction.emoji, reaction.user_id, reaction.message_id
            )));
        }

        table.last_id += 1;
        let stored = Reaction {
            id: ReactionId::new(table.last_id),
            message_id: reaction.message_id,
            user_id: reaction.user_id,
            emoji: reaction.emoji,
            created_at: reaction.created_at,
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn find_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: &Emoji,
    ) -> Result<Option<Reaction>, RepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .position(message_id, user_id, emoji)
            .map(|index| table.rows[index].clone()))
    }

    async fn delete_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: &Emoji,
    ) -> Result<bool, RepositoryError> {
        let mut table = self.table.lock().await;
        match table.position(message_id, user_id, emoji) {
            Some(index) => {
                table.rows.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn thumbs_up() -> Emoji {
        Emoji::new("👍".to_string()).unwrap()
    }

    fn new_reaction(message_id: i64, user_id: i64) -> NewReaction {
        NewReaction {
            message_id: MessageId::new(message_id),
            user_id: UserId::new(user_id),
            emoji: thumbs_up(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_duplicate_reaction_conflicts() {
        // テスト項目: 同じ (message, user, emoji) のリアクションは Conflict になる
        // given (前提条件):
        let repo = InMemoryReactionRepository::new();
        let first = repo.create_reaction(new_reaction(1, 2)).await.unwrap();

        // when (操作):
        let second = repo.create_reaction(new_reaction(1, 2)).await;

        // then (期待する結果):
        assert!(matches!(second, Err(RepositoryError::Conflict(_))));
        let found = repo
            .find_reaction(MessageId::new(1), UserId::new(2), &thumbs_up())
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.id), Some(first.id));
    }

    #[tokio::test]
    async fn test_delete_reaction_reports_whether_removed() {
        // テスト項目: 削除は存在した場合のみ true を返し、2回目は false になる
        // given (前提条件):
        let repo = InMemoryReactionRepository::new();
        repo.create_reaction(new_reaction(1, 2)).await.unwrap();

        // when (操作):
        let first = repo
            .delete_reaction(MessageId::new(1), UserId::new(2), &thumbs_up())
            .await
            .unwrap();
        let second = repo
            .delete_reaction(MessageId::new(1), UserId::new(2), &thumbs_up())
            .await
            .unwrap();

        // then (期待する結果):
        assert!(first);
        assert!(!second);
    }
}
