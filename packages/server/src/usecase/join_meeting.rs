//! UseCase: ミーティングへの参加
//!
//! 参加は冪等です。既に参加済みなら何もせず成功します。

use crate::domain::{MeetingId, Participant, UserId};

use super::{chat_service::MeetingChatService, error::ChatError};

impl MeetingChatService {
    /// ミーティングに参加する
    ///
    /// # Errors
    ///
    /// * `ChatError::NotFound` - ミーティングが存在しない
    pub async fn join_meeting(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
    ) -> Result<(), ChatError> {
        let meetings = &self.repositories.meetings;

        if meetings.get_meeting(meeting_id).await?.is_none() {
            return Err(ChatError::meeting_not_found(meeting_id));
        }

        if meetings.is_participant(meeting_id, user_id).await? {
            tracing::debug!("User {} already participates in meeting {}", user_id, meeting_id);
            return Ok(());
        }

        let participant = Participant {
            meeting_id,
            user_id,
            joined_at: self.clock.now(),
        };
        match meetings.add_participant(participant).await.map_err(ChatError::from) {
            Ok(()) => {
                tracing::info!("User {} joined meeting {}", user_id, meeting_id);
                Ok(())
            }
            // 同時に参加した別の接続が先に登録した
            Err(ChatError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
