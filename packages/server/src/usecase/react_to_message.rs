//! UseCase: リアクションの追加・削除
//!
//! - 追加は冪等（既存の行があればそのまま成功、同時追加による一意制約違反も成功扱い）
//! - 存在しないリアクションの削除は何もせず成功
//!
//! どちらも配信用の `ReactionChange` を返します。

use crate::domain::{
    Emoji, Message, MessageId, NewReaction, ReactionAction, ReactionChange, UserId,
};

use super::{chat_service::MeetingChatService, error::ChatError};

impl MeetingChatService {
    /// メッセージにリアクションを追加する
    ///
    /// # Errors
    ///
    /// * `ChatError::NotFound` - メッセージが存在しない
    /// * `ChatError::Forbidden` - メッセージのミーティングの参加者ではない
    pub async fn add_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: Emoji,
    ) -> Result<ReactionChange, ChatError> {
        let message = self.reactable_message(message_id, user_id).await?;
        let reactions = &self.repositories.reactions;

        if reactions
            .find_reaction(message_id, user_id, &emoji)
            .await?
            .is_none()
        {
            let created = reactions
                .create_reaction(NewReaction {
                    message_id,
                    user_id,
                    emoji: emoji.clone(),
                    created_at: self.clock.now(),
                })
                .await
                .map_err(ChatError::from);
            match created {
                Ok(_) | Err(ChatError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(self.reaction_change(&message, user_id, emoji, ReactionAction::Added))
    }

    /// メッセージからリアクションを削除する
    ///
    /// # Errors
    ///
    /// * `ChatError::NotFound` - メッセージが存在しない
    /// * `ChatError::Forbidden` - メッセージのミーティングの参加者ではない
    pub async fn remove_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: Emoji,
    ) -> Result<ReactionChange, ChatError> {
        let message = self.reactable_message(message_id, user_id).await?;

        let removed = self
            .repositories
            .reactions
            .delete_reaction(message_id, user_id, &emoji)
            .await?;
        if !removed {
            tracing::debug!(
                "Reaction {} by user {} on message {} was already absent",
                emoji,
                user_id,
                message_id
            );
        }

        Ok(self.reaction_change(&message, user_id, emoji, ReactionAction::Removed))
    }

    /// メッセージの存在と、ユーザーがそのミーティングの参加者であることを確認
    async fn reactable_message(
        &self,
        message_id: MessageId,
        user_id: UserId,
    ) -> Result<Message, ChatError> {
        let message = self
            .repositories
            .messages
            .get_message(message_id)
            .await?
            .ok_or(ChatError::NotFound {
                resource: "message",
                id: message_id.value(),
            })?;

        if !self
            .repositories
            .meetings
            .is_participant(message.meeting_id, user_id)
            .await?
        {
            return Err(ChatError::Forbidden {
                meeting_id: message.meeting_id,
                user_id,
            });
        }
        Ok(message)
    }

    fn reaction_change(
        &self,
        message: &Message,
        user_id: UserId,
        emoji: Emoji,
        action: ReactionAction,
    ) -> ReactionChange {
        ReactionChange {
            meeting_id: message.meeting_id,
            message_id: message.id,
            user_id,
            emoji,
            action,
            occurred_at: self.clock.now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{
        MessageKind, MockReactionRepository, ReactionRepository, RepositoryError,
    };
    use crate::usecase::{SendMessageCommand, chat_service::test_support::*};

    fn emoji(value: &str) -> Emoji {
        Emoji::new(value.to_string()).unwrap()
    }

    async fn posted_message(service: &MeetingChatService) -> Message {
        service.join_meeting(MEETING, ALICE).await.unwrap();
        service.join_meeting(MEETING, BOB).await.unwrap();
        service
            .send_message(SendMessageCommand {
                meeting_id: MEETING,
                sender_id: ALICE,
                parent_message_id: None,
                content: "ship it?".to_string(),
                kind: MessageKind::Text,
                attachments: Vec::new(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_reaction_returns_broadcast_ready_change() {
        // テスト項目: リアクションが保存され、配信用の変更内容が返る
        // given (前提条件):
        let fixture = Fixture::seeded().await;
        let service = fixture.service();
        let message = posted_message(&service).await;

        // when (操作):
        let change = service
            .add_reaction(message.id, BOB, emoji("👍"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            change,
            ReactionChange {
                meeting_id: MEETING,
                message_id: message.id,
                user_id: BOB,
                emoji: emoji("👍"),
                action: ReactionAction::Added,
                occurred_at: now(),
            }
        );
        let stored = fixture
            .reactions
            .find_reaction(message.id, BOB, &emoji("👍"))
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_add_reaction_is_idempotent() {
        // テスト項目: 同じリアクションを2回追加しても成功し、行は1つのまま
        // given (前提条件):
        let fixture = Fixture::seeded().await;
        let service = fixture.service();
        let message = posted_message(&service).await;
        service
            .add_reaction(message.id, BOB, emoji("👍"))
            .await
            .unwrap();

        // when (操作):
        let second = service.add_reaction(message.id, BOB, emoji("👍")).await;

        // then (期待する結果):
        assert!(second.is_ok());
        assert!(
            fixture
                .reactions
                .delete_reaction(message.id, BOB, &emoji("👍"))
                .await
                .unwrap()
        );
        assert!(
            !fixture
                .reactions
                .delete_reaction(message.id, BOB, &emoji("👍"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_add_reaction_tolerates_concurrent_conflict() {
        // テスト項目: 確認後に同じリアクションが同時に追加された（Conflict）場合も成功する
        // given (前提条件):
        let fixture = Fixture::seeded().await;
        let mut reactions = MockReactionRepository::new();
        reactions.expect_find_reaction().returning(|_, _, _| Ok(None));
        reactions
            .expect_create_reaction()
            .times(1)
            .returning(|_| Err(RepositoryError::Conflict("duplicate".to_string())));
        let mut repositories = fixture.repositories();
        repositories.reactions = Arc::new(reactions);
        let service = Fixture::service_with(repositories);
        let message = posted_message(&service).await;

        // when (操作):
        let change = service.add_reaction(message.id, BOB, emoji("🎉")).await;

        // then (期待する結果):
        assert_eq!(change.map(|c| c.action), Ok(ReactionAction::Added));
    }

    #[tokio::test]
    async fn test_remove_absent_reaction_succeeds() {
        // テスト項目: 存在しないリアクションの削除は成功し、removed の変更内容が返る
        // given (前提条件):
        let fixture = Fixture::seeded().await;
        let service = fixture.service();
        let message = posted_message(&service).await;

        // when (操作):
        let change = service
            .remove_reaction(message.id, BOB, emoji("👀"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(change.action, ReactionAction::Removed);
        assert_eq!(change.meeting_id, MEETING);
    }

    #[tokio::test]
    async fn test_reaction_on_unknown_message_is_not_found() {
        // テスト項目: 存在しないメッセージへのリアクションは NotFound
        // given (前提条件):
        let fixture = Fixture::seeded().await;
        let service = fixture.service();

        // when (操作):
        let result = service
            .add_reaction(MessageId::new(404), ALICE, emoji("👍"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ChatError::NotFound {
                resource: "message",
                id: 404
            })
        );
    }

    #[tokio::test]
    async fn test_reaction_by_non_participant_is_forbidden() {
        // テスト項目: メッセージのミーティングの参加者でないユーザーは Forbidden
        // given (前提条件):
        let fixture = Fixture::seeded().await;
        let service = fixture.service();
        let message = posted_message(&service).await;

        // when (操作):
        let added = service.add_reaction(message.id, MALLORY, emoji("👎")).await;
        let removed = service
            .remove_reaction(message.id, MALLORY, emoji("👎"))
            .await;

        // then (期待する結果):
        assert!(matches!(added, Err(ChatError::Forbidden { .. })));
        assert!(matches!(removed, Err(ChatError::Forbidden { .. })));
    }
}
