//! Shared application state.

use std::sync::Arc;

use crate::{config::ConnectionSettings, usecase::MeetingChatService};

/// Shared application state
pub struct AppState {
    /// MeetingChatService（チャットのユースケース）
    pub chat_service: Arc<MeetingChatService>,
    /// Per-connection limits and timers
    pub settings: ConnectionSettings,
}
