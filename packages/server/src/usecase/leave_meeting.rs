//! UseCase: ミーティングからの退出

use crate::domain::{MeetingId, UserId};

use super::{chat_service::MeetingChatService, error::ChatError};

impl MeetingChatService {
    /// ミーティングから退出する（参加していなくても成功）
    ///
    /// # Errors
    ///
    /// * `ChatError::NotFound` - ミーティングが存在しない
    pub async fn leave_meeting(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
    ) -> Result<(), ChatError> {
        let meetings = &self.repositories.meetings;

        if meetings.get_meeting(meeting_id).await?.is_none() {
            return Err(ChatError::meeting_not_found(meeting_id));
        }

        meetings.remove_participant(meeting_id, user_id).await?;
        tracing::info!("User {} left meeting {}", user_id, meeting_id);
        Ok(())
    }
}
