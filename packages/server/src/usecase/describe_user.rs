//! UseCase: 表示用ユーザー情報の解決

use crate::domain::{User, UserId};

use super::chat_service::MeetingChatService;

impl MeetingChatService {
    /// 配信に付けるユーザー情報を解決する
    ///
    /// 解決できない場合は ID のみのユーザーを返します（配信自体は止めない）。
    pub async fn describe_user(&self, user_id: UserId) -> User {
        match self.repositories.users.get_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("User {} not found, sending without display fields", user_id);
                User::unresolved(user_id)
            }
            Err(e) => {
                tracing::warn!("Failed to resolve user {}: {}", user_id, e);
                User::unresolved(user_id)
            }
        }
    }
}
