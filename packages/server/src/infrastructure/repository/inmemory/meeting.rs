//! InMemory Meeting Repository 実装
//!
//! ミーティングの作成は外部コラボレーター（ミーティング管理）の責務のため、
//! このリポジトリはシード用の `insert_meeting` のみを追加で公開します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Meeting, MeetingId, MeetingRepository, Participant, RepositoryError, UserId};

#[derive(Default)]
struct MeetingTable {
    meetings: HashMap<MeetingId, Meeting>,
    /// 参加順に保持
    participants: Vec<Participant>,
}

/// インメモリ Meeting Repository 実装
#[derive(Default)]
pub struct InMemoryMeetingRepository {
    table: Mutex<MeetingTable>,
}

impl InMemoryMeetingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// ミーティングを登録（同じ ID があれば置き換える）
    pub async fn insert_meeting(&self, meeting: Meeting) {
        let mut table = self.table.lock().await;
        table.meetings.insert(meeting.id, meeting);
    }
}

#[async_trait]
impl MeetingRepository for InMemoryMeetingRepository {
    async fn get_meeting(&self, meeting_id: MeetingId) -> Result<Option<Meeting>, RepositoryError> {
        let table = self.table.lock().await;
        Ok(table.meetings.get(&meeting_id).cloned())
    }

    async fn add_participant(&self, participant: Participant) -> Result<(), RepositoryError> {
        let mut table = self.table.lock().await;
        let exists = table
            .participants
            .iter()
            .any(|p| p.meeting_id == participant.meeting_id && p.user_id == participant.user_id);
        if exists {
            return Err(RepositoryError::Conflict(format!(
                "user {} already participates in meeting {}",
                participant.user_id, participant.meeting_id
            )));
        }
        table.participants.push(participant);
        Ok(())
    }

    async fn remove_participant(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let mut table = self.table.lock().await;
        table
            .participants
            .retain(|p| !(p.meeting_id == meeting_id && p.user_id == user_id));
        Ok(())
    }

    async fn is_participant(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .participants
            .iter()
            .any(|p| p.meeting_id == meeting_id && p.user_id == user_id))
    }

    async fn list_participants(
        &self,
        meeting_id: MeetingId,
    ) -> Result<Vec<Participant>, RepositoryError> {
        let table = self.table.lock().await;
        Ok(table
            .participants
            .iter()
            .filter(|p| p.meeting_id == meeting_id)
            .cloned()
            .collect())
    }
}
