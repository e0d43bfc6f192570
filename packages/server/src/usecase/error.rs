//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{MeetingId, RepositoryError, UserId};

/// チャットサービスの操作エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: i64 },

    #[error("user {user_id} is not a participant of meeting {meeting_id}")]
    Forbidden {
        meeting_id: MeetingId,
        user_id: UserId,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl ChatError {
    pub(crate) fn meeting_not_found(meeting_id: MeetingId) -> Self {
        ChatError::NotFound {
            resource: "meeting",
            id: meeting_id.value(),
        }
    }
}

impl From<RepositoryError> for ChatError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Conflict(message) => ChatError::Conflict(message),
            other => ChatError::Repository(other),
        }
    }
}
