//! Hub レジストリ
//!
//! ミーティング ID から Hub ハンドルを引く表です。サーバー起動時に1つ作られ、
//! `MessagePusher` としてチャットサービスに渡されます。
//!
//! 表のロックは検索・作成の間だけ保持し、Hub のループの間は保持しません。

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ClientHandle, ConnectionId, Frame, MeetingId, MemberInfo, MessagePushError, MessagePusher,
};

use super::hub::{HubHandle, HubSlots, spawn_hub};

/// 登録先の Hub が同時に終了した場合の再試行回数
const REGISTER_ATTEMPTS: usize = 3;

/// Hub の設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubSettings {
    /// Hub のコマンドキューの容量
    pub command_capacity: usize,
    /// メンバーが空になってから Hub を破棄するまでの猶予期間
    pub idle_grace: Duration,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            command_capacity: 256,
            idle_grace: Duration::from_secs(30),
        }
    }
}

/// ミーティングごとの Hub のレジストリ
pub struct HubRegistry {
    slots: HubSlots,
    settings: HubSettings,
}

impl HubRegistry {
    pub fn new(settings: HubSettings) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            settings,
        }
    }

    /// 稼働中の Hub を返す（無い、または停止済みなら作成する）
    pub async fn get_or_create(&self, meeting_id: MeetingId) -> HubHandle {
        let mut slots = self.slots.lock().await;
        if let Some(handle) = slots.get(&meeting_id)
            && !handle.is_closed()
        {
            return handle.clone();
        }

        let handle = spawn_hub(
            meeting_id,
            self.settings.command_capacity,
            self.settings.idle_grace,
            Arc::clone(&self.slots),
        );
        slots.insert(meeting_id, handle.clone());
        handle
    }

    /// 稼働中の Hub を返す（作成はしない）
    pub async fn get(&self, meeting_id: MeetingId) -> Option<HubHandle> {
        let slots = self.slots.lock().await;
        slots
            .get(&meeting_id)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// 登録されている Hub の数
    pub async fn hub_count(&self) -> usize {
        self.slots.lock().await.len()
    }
}

impl Default for HubRegistry {
    fn default() -> Self {
        Self::new(HubSettings::default())
    }
}

#[async_trait]
impl MessagePusher for HubRegistry {
    async fn register_client(
        &self,
        meeting_id: MeetingId,
        client: ClientHandle,
    ) -> Result<(), MessagePushError> {
        for attempt in 1..=REGISTER_ATTEMPTS {
            let hub = self.get_or_create(meeting_id).await;
            match hub.register(client.clone()).await {
                Ok(()) => return Ok(()),
                Err(_) => {
                    tracing::debug!(
                        "Hub {} for meeting {} stopped during registration (attempt {}/{})",
                        hub.id(),
                        meeting_id,
                        attempt,
                        REGISTER_ATTEMPTS
                    );
                }
            }
        }

        tracing::warn!(
            "Failed to register connection {} to meeting {}",
            client.connection_id,
            meeting_id
        );
        Err(MessagePushError::HubUnavailable(meeting_id.value()))
    }

    async fn unregister_client(&self, meeting_id: MeetingId, connection_id: ConnectionId) {
        let Some(hub) = self.get(meeting_id).await else {
            tracing::debug!(
                "No hub for meeting {}, skipping unregistration of {}",
                meeting_id,
                connection_id
            );
            return;
        };
        if hub.unregister(connection_id).await.is_err() {
            tracing::debug!("Hub for meeting {} stopped before unregistration", meeting_id);
        }
    }

    async fn broadcast(&self, meeting_id: MeetingId, frame: Frame) {
        let Some(hub) = self.get(meeting_id).await else {
            tracing::debug!("No hub for meeting {}, skipping broadcast", meeting_id);
            return;
        };
        if hub.broadcast(frame).await.is_err() {
            tracing::debug!("Hub for meeting {} stopped before broadcast", meeting_id);
        }
    }

    async fn members(&self, meeting_id: MeetingId) -> Vec<MemberInfo> {
        match self.get(meeting_id).await {
            Some(hub) => hub.members().await.unwrap_or_default(),
            None => Vec::new(),
        }
    }

    async fn shutdown(&self) {
        let hubs: Vec<HubHandle> = {
            let mut slots = self.slots.lock().await;
            slots.drain().map(|(_, handle)| handle).collect()
        };

        tracing::info!("Shutting down {} hub(s)", hubs.len());
        for hub in hubs {
            hub.shutdown().await;
        }
    }
}
