//! MessagePusher trait 定義
//!
//! ライブ接続へのメッセージ配信のインターフェースです。
//! 実装（ミーティングごとの Hub とそのレジストリ）は Infrastructure 層にあります。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MeetingId, MessagePushError, UserId};

/// エンコード済みの送信フレーム（受信者間で共有される）
pub type Frame = Arc<str>;

/// 接続の送信キュー
pub type PusherChannel = mpsc::Sender<Frame>;

/// Hub に登録される接続
///
/// `sender` は Hub だけが保持します。Hub がこのハンドルを破棄すると
/// 送信キューが閉じ、接続の書き込みループが終了します。
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub sender: PusherChannel,
}

/// Hub に登録されている接続の情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberInfo {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
}

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続をミーティングの Hub に登録（Hub が無ければ作成）
    async fn register_client(
        &self,
        meeting_id: MeetingId,
        client: ClientHandle,
    ) -> Result<(), MessagePushError>;

    /// 接続をミーティングの Hub から登録解除
    async fn unregister_client(&self, meeting_id: MeetingId, connection_id: ConnectionId);

    /// ミーティングの全接続へフレームを配信（Hub が無ければ何もしない）
    async fn broadcast(&self, meeting_id: MeetingId, frame: Frame);

    /// ミーティングに登録中の接続一覧
    async fn members(&self, meeting_id: MeetingId) -> Vec<MemberInfo>;

    /// 全 Hub を停止
    async fn shutdown(&self);
}
