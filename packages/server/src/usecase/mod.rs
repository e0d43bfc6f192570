//! UseCase layer
//!
//! ミーティングチャットのユースケースを提供します。
//! 操作ごとのモジュールが `MeetingChatService` に操作を実装しています。

mod chat_service;
mod describe_user;
mod error;
mod join_meeting;
mod leave_meeting;
mod message_history;
mod react_to_message;
mod send_message;

pub use chat_service::{MeetingChatService, Repositories};
pub use error::ChatError;
pub use message_history::HistoryPageResult;
pub use send_message::SendMessageCommand;

#[cfg(test)]
pub(crate) use chat_service::test_support;
