//! Repository trait 定義
//!
//! チャットコアが必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 依存性の逆転（DIP）
//!
//! - UseCase 層はこれらの trait にのみ依存する
//! - 永続化の実体（RDB・インメモリ）は Infrastructure 層が差し替える

use async_trait::async_trait;

use super::{
    Attachment, Emoji, Meeting, MeetingId, Message, MessageId, NewAttachment, NewMessage,
    NewReaction, Participant, Reaction, RepositoryError, User, UserId,
};

/// ミーティングと参加者の Repository
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeetingRepository: Send + Sync {
    /// ミーティングを取得（存在しなければ `None`）
    async fn get_meeting(&self, meeting_id: MeetingId) -> Result<Option<Meeting>, RepositoryError>;

    /// 参加者を追加（既に参加済みなら `Conflict`）
    async fn add_participant(&self, participant: Participant) -> Result<(), RepositoryError>;

    /// 参加者を削除（存在しなくてもエラーにしない）
    async fn remove_participant(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
    ) -> Result<(), RepositoryError>;

    /// 参加者かどうか
    async fn is_participant(
        &self,
        meeting_id: MeetingId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError>;

    /// 参加者一覧（参加順）
    async fn list_participants(
        &self,
        meeting_id: MeetingId,
    ) -> Result<Vec<Participant>, RepositoryError>;
}

/// メッセージの Repository
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを保存し、ID 採番済みのメッセージを返す
    async fn create_message(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    /// メッセージを取得（存在しなければ `None`）
    async fn get_message(&self, message_id: MessageId) -> Result<Option<Message>, RepositoryError>;

    /// ミーティングのメッセージを新しい順に取得
    async fn list_by_meeting(
        &self,
        meeting_id: MeetingId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>, RepositoryError>;
}

/// 添付ファイルの Repository
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn create_attachment(
        &self,
        attachment: NewAttachment,
    ) -> Result<Attachment, RepositoryError>;

    /// メッセージの添付ファイルを作成順に取得
    async fn list_by_message(
        &self,
        message_id: MessageId,
    ) -> Result<Vec<Attachment>, RepositoryError>;
}

/// リアクションの Repository
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// リアクションを保存（一意キーが重複すれば `Conflict`）
    async fn create_reaction(&self, reaction: NewReaction) -> Result<Reaction, RepositoryError>;

    async fn find_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: &Emoji,
    ) -> Result<Option<Reaction>, RepositoryError>;

    /// リアクションを削除し、削除したかどうかを返す
    async fn delete_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: &Emoji,
    ) -> Result<bool, RepositoryError>;
}

/// ユーザー情報の解決
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, RepositoryError>;
}
