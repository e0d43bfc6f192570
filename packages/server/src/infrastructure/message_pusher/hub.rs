//! ミーティングごとの Hub
//!
//! ## 責務
//!
//! - ミーティングに接続中のクライアント集合を唯一の所有者として管理
//! - 登録・登録解除・ブロードキャストを1本のコマンドキューから順番に処理
//!
//! ## 設計ノート
//!
//! メンバー集合は Hub タスクの中だけで変更されるため、ロックは不要です。
//! ブロードキャストは `try_send` のみを使い、送信キューが満杯のクライアントは
//! その場でメンバーから外します（送信側を破棄するとキューが閉じ、接続の書き込み
//! ループが終了します）。
//!
//! メンバーが空のまま猶予期間が過ぎると、Hub はレジストリのロックを取った上で
//! 自分自身をレジストリから外して終了します。

use std::{collections::HashMap, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{
    sync::{
        Mutex,
        mpsc::{self, error::TrySendError},
        oneshot,
    },
    time::{Instant, sleep_until},
};
use uuid::Uuid;

use crate::domain::{ClientHandle, ConnectionId, Frame, MeetingId, MemberInfo};

/// レジストリが保持する Hub ハンドルの表
pub(crate) type HubSlots = Arc<Mutex<HashMap<MeetingId, HubHandle>>>;

/// Hub が既に停止している
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("hub has stopped")]
pub struct HubStopped;

#[derive(Debug)]
enum HubCommand {
    Register {
        client: ClientHandle,
        ack: oneshot::Sender<()>,
    },
    Unregister {
        connection_id: ConnectionId,
    },
    Broadcast {
        frame: Frame,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<MemberInfo>>,
    },
    Shutdown,
}

/// Hub へのコマンド送信口
#[derive(Debug, Clone)]
pub struct HubHandle {
    id: Uuid,
    commands: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Hub インスタンスの ID（同じミーティングでも作り直すと変わる）
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Hub がコマンドを受け付けなくなったか
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// クライアントを登録し、Hub が受け付けるまで待つ
    ///
    /// 登録がキューに残ったまま Hub が終了した場合は `HubStopped` を返します。
    pub async fn register(&self, client: ClientHandle) -> Result<(), HubStopped> {
        let (ack, acked) = oneshot::channel();
        self.commands
            .send(HubCommand::Register { client, ack })
            .await
            .map_err(|_| HubStopped)?;
        acked.await.map_err(|_| HubStopped)
    }

    pub async fn unregister(&self, connection_id: ConnectionId) -> Result<(), HubStopped> {
        self.commands
            .send(HubCommand::Unregister { connection_id })
            .await
            .map_err(|_| HubStopped)
    }

    pub async fn broadcast(&self, frame: Frame) -> Result<(), HubStopped> {
        self.commands
            .send(HubCommand::Broadcast { frame })
            .await
            .map_err(|_| HubStopped)
    }

    pub async fn members(&self) -> Result<Vec<MemberInfo>, HubStopped> {
        let (reply, replied) = oneshot::channel();
        self.commands
            .send(HubCommand::Snapshot { reply })
            .await
            .map_err(|_| HubStopped)?;
        replied.await.map_err(|_| HubStopped)
    }

    /// Hub を停止（全メンバーの送信キューが閉じる）
    pub async fn shutdown(&self) {
        // 既に停止していれば何もしない
        let _ = self.commands.send(HubCommand::Shutdown).await;
    }
}

/// Hub タスクを起動し、そのハンドルを返す
pub(crate) fn spawn_hub(
    meeting_id: MeetingId,
    command_capacity: usize,
    idle_grace: Duration,
    slots: HubSlots,
) -> HubHandle {
    let (commands_tx, commands_rx) = mpsc::channel(command_capacity.max(1));
    let handle = HubHandle {
        id: Uuid::new_v4(),
        commands: commands_tx,
    };

    let hub = Hub {
        id: handle.id,
        meeting_id,
        commands: commands_rx,
        members: Vec::new(),
        idle_grace,
        slots,
    };
    tokio::spawn(hub.run());

    tracing::debug!("Hub {} created for meeting {}", handle.id, meeting_id);
    handle
}

struct Hub {
    id: Uuid,
    meeting_id: MeetingId,
    commands: mpsc::Receiver<HubCommand>,
    /// 登録順
    members: Vec<ClientHandle>,
    idle_grace: Duration,
    slots: HubSlots,
}

impl Hub {
    async fn run(mut self) {
        // 作成直後はメンバーがいないため、猶予期間の計測を開始する
        let mut idle_deadline = Some(Instant::now() + self.idle_grace);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        // 全てのハンドルが破棄された
                        break;
                    };
                    if !self.handle(command) {
                        break;
                    }
                }
                _ = idle_timeout(idle_deadline) => {
                    self.evict().await;
                    break;
                }
            }

            idle_deadline = match (self.members.is_empty(), idle_deadline) {
                (false, _) => None,
                (true, Some(deadline)) => Some(deadline),
                (true, None) => Some(Instant::now() + self.idle_grace),
            };
        }

        // 残ったメンバーの送信キューを閉じる
        self.members.clear();
        tracing::debug!("Hub {} for meeting {} stopped", self.id, self.meeting_id);
    }

    /// コマンドを処理し、続行するかどうかを返す
    fn handle(&mut self, command: HubCommand) -> bool {
        match command {
            HubCommand::Register { client, ack } => {
                tracing::debug!(
                    "Connection {} (user {}) registered to meeting {}",
                    client.connection_id,
                    client.user_id,
                    self.meeting_id
                );
                self.members.push(client);
                // 登録者が待つのをやめていても登録は有効
                let _ = ack.send(());
            }
            HubCommand::Unregister { connection_id } => {
                let before = self.members.len();
                self.members.retain(|m| m.connection_id != connection_id);
                if self.members.len() < before {
                    tracing::debug!(
                        "Connection {} unregistered from meeting {}",
                        connection_id,
                        self.meeting_id
                    );
                }
            }
            HubCommand::Broadcast { frame } => self.broadcast(frame),
            HubCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            HubCommand::Shutdown => {
                tracing::debug!("Hub {} for meeting {} shutting down", self.id, self.meeting_id);
                return false;
            }
        }
        true
    }

    fn broadcast(&mut self, frame: Frame) {
        let meeting_id = self.meeting_id;
        self.members
            .retain(|member| match member.sender.try_send(Arc::clone(&frame)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        "Outbound queue of connection {} (user {}) is full, dropping it from meeting {}",
                        member.connection_id,
                        member.user_id,
                        meeting_id
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        "Connection {} already closed, dropping it from meeting {}",
                        member.connection_id,
                        meeting_id
                    );
                    false
                }
            });
    }

    fn snapshot(&self) -> Vec<MemberInfo> {
        self.members
            .iter()
            .map(|m| MemberInfo {
                connection_id: m.connection_id,
                user_id: m.user_id,
            })
            .collect()
    }

    /// レジストリから自分を外し、キューに残ったコマンドを破棄する
    async fn evict(&mut self) {
        let mut slots = self.slots.lock().await;
        if slots
            .get(&self.meeting_id)
            .is_some_and(|handle| handle.id == self.id)
        {
            slots.remove(&self.meeting_id);
        }
        self.commands.close();

        // 破棄された登録の ack は送られないため、登録者は新しい Hub で再試行する
        let mut discarded = 0usize;
        while let Ok(command) = self.commands.try_recv() {
            if let HubCommand::Snapshot { reply } = command {
                let _ = reply.send(Vec::new());
            }
            discarded += 1;
        }
        drop(slots);

        tracing::info!(
            "Hub {} for meeting {} evicted after idle period ({} queued commands discarded)",
            self.id,
            self.meeting_id,
            discarded
        );
    }
}

async fn idle_timeout(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
