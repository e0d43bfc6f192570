//! UseCase: ミーティングチャットサービス
//!
//! ライブ接続の通信と永続化された状態（メッセージ・リアクション・添付ファイル）を橋渡しします。
//! 各操作は操作ごとのモジュール（`join_meeting`, `send_message` など）に実装されています。
//!
//! ## 認可
//!
//! メッセージ送信とリアクションは、ミーティングの参加者であることを
//! 永続化・配信の前に確認します。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parley_shared::time::Clock;

use crate::domain::{
    AttachmentRepository, ClientHandle, ConnectionId, Frame, MeetingId, MeetingRepository,
    MemberInfo, MessagePushError, MessagePusher, MessageRepository, ReactionRepository,
    UserRepository,
};

/// チャットサービスが使う Repository 一式
#[derive(Clone)]
pub struct Repositories {
    pub meetings: Arc<dyn MeetingRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub attachments: Arc<dyn AttachmentRepository>,
    pub reactions: Arc<dyn ReactionRepository>,
    pub users: Arc<dyn UserRepository>,
}

/// ミーティングチャットのユースケース
pub struct MeetingChatService {
    pub(super) repositories: Repositories,
    /// MessagePusher（ライブ接続への配信の抽象化）
    pub(super) message_pusher: Arc<dyn MessagePusher>,
    pub(super) clock: Arc<dyn Clock>,
}

impl MeetingChatService {
    pub fn new(
        repositories: Repositories,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repositories,
            message_pusher,
            clock,
        }
    }

    /// サービスの時計での現在時刻（入退室通知の時刻に使う）
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// ミーティングの全接続へエンコード済みフレームを配信
    pub async fn broadcast_message(&self, meeting_id: MeetingId, frame: Frame) {
        self.message_pusher.broadcast(meeting_id, frame).await;
    }

    pub async fn register_client(
        &self,
        meeting_id: MeetingId,
        client: ClientHandle,
    ) -> Result<(), MessagePushError> {
        self.message_pusher.register_client(meeting_id, client).await
    }

    pub async fn unregister_client(&self, meeting_id: MeetingId, connection_id: ConnectionId) {
        self.message_pusher
            .unregister_client(meeting_id, connection_id)
            .await;
    }

    /// ミーティングに接続中の接続一覧
    pub async fn connections_of(&self, meeting_id: MeetingId) -> Vec<MemberInfo> {
        self.message_pusher.members(meeting_id).await
    }

    /// 全 Hub を停止（サーバー停止時）
    pub async fn shutdown(&self) {
        self.message_pusher.shutdown().await;
    }
}
