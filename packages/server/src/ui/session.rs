//! Per-connection frame dispatcher.
//!
//! Decodes each inbound frame, checks it against the connection's meeting,
//! invokes the matching chat service operation and broadcasts the result.
//! Protocol and service failures are answered with an `error` frame on the
//! connection's direct queue; they never end the connection.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, Emoji, Frame, MeetingId, MessageId, ReactionAction, UserId},
    infrastructure::dto::{
        codec::{InboundFrame, decode_frame, encode_frame},
        conversion::message_kind_from_wire,
        websocket::{
            ErrorBody, ErrorCode, HistoryPage, HistoryPayload, MessageEvent, MessagePayload,
            OutboundFrame, ReactionEvent, ReactionPayload, RoomAction, RoomEvent, TypingEvent,
            TypingPayload,
        },
    },
    usecase::{ChatError, MeetingChatService, SendMessageCommand},
};

use super::presenter::message_events;

/// Receives every decoded-or-not inbound data frame of one connection.
#[async_trait]
pub trait FrameHandler: Send + Sync {
    async fn handle_frame(&self, frame: &[u8]);
}

/// The server side of one live connection
pub struct Session {
    service: Arc<MeetingChatService>,
    meeting_id: MeetingId,
    user_id: UserId,
    connection_id: ConnectionId,
    direct: mpsc::Sender<Frame>,
    history_page_size: usize,
}

impl Session {
    pub fn new(
        service: Arc<MeetingChatService>,
        meeting_id: MeetingId,
        user_id: UserId,
        connection_id: ConnectionId,
        direct: mpsc::Sender<Frame>,
        history_page_size: usize,
    ) -> Self {
        Self {
            service,
            meeting_id,
            user_id,
            connection_id,
            direct,
            history_page_size,
        }
    }

    /// Broadcast a `room` join/leave notice for this connection's user.
    pub async fn announce(&self, action: RoomAction) {
        let user = self.service.describe_user(self.user_id).await;
        let event = RoomEvent::new(self.meeting_id, user, action, self.service.now());
        self.broadcast(&OutboundFrame::Room(event)).await;
    }

    /// Broadcast the leave notice unless the user is still connected elsewhere in the meeting.
    pub async fn announce_leave(&self) {
        let still_connected = self
            .service
            .connections_of(self.meeting_id)
            .await
            .iter()
            .any(|m| m.user_id == self.user_id && m.connection_id != self.connection_id);
        if still_connected {
            tracing::debug!(
                "User {} still has a live connection in meeting {}, skipping leave notice",
                self.user_id,
                self.meeting_id
            );
            return;
        }
        self.announce(RoomAction::Leave).await;
    }

    async fn on_message(&self, payload: MessagePayload) {
        if let Err(body) = self.check_room(payload.room_id) {
            return self.reply_error(body).await;
        }

        let command = SendMessageCommand {
            meeting_id: self.meeting_id,
            sender_id: self.user_id,
            parent_message_id: payload.reply_to.map(MessageId::new),
            kind: message_kind_from_wire(payload.kind.as_deref()),
            content: payload.content,
            attachments: payload.files.into_iter().map(Into::into).collect(),
        };

        match self.service.send_message(command).await {
            Ok(message) => {
                let sender = self.service.describe_user(self.user_id).await;
                let event = MessageEvent::from_domain(message, sender);
                self.broadcast(&OutboundFrame::Message(event)).await;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to send message from user {} in meeting {}: {}",
                    self.user_id,
                    self.meeting_id,
                    e
                );
                self.reply_error(service_error(ErrorCode::SendFailed, &e)).await;
            }
        }
    }

    async fn on_reaction(&self, payload: ReactionPayload) {
        let emoji = match Emoji::new(payload.emoji.clone()) {
            Ok(emoji) => emoji,
            Err(e) => {
                return self
                    .reply_error(ErrorBody::new(ErrorCode::InvalidReactionData, e.to_string()))
                    .await;
            }
        };
        let Some(action) = payload.requested_action() else {
            return self
                .reply_error(ErrorBody::new(
                    ErrorCode::InvalidReactionAction,
                    format!("Action: {}", payload.action),
                ))
                .await;
        };

        let message_id = MessageId::new(payload.message_id);
        let result = match action {
            ReactionAction::Added => self.service.add_reaction(message_id, self.user_id, emoji).await,
            ReactionAction::Removed => {
                self.service
                    .remove_reaction(message_id, self.user_id, emoji)
                    .await
            }
        };

        match result {
            Ok(change) => {
                let user = self.service.describe_user(self.user_id).await;
                let meeting_id = change.meeting_id;
                let event = ReactionEvent::from_domain(change, user);
                self.broadcast_to(meeting_id, &OutboundFrame::Reaction(event))
                    .await;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to handle reaction from user {} on message {}: {}",
                    self.user_id,
                    message_id,
                    e
                );
                self.reply_error(service_error(ErrorCode::ReactionFailed, &e))
                    .await;
            }
        }
    }

    async fn on_typing(&self, payload: TypingPayload) {
        if let Err(body) = self.check_room(payload.room_id) {
            return self.reply_error(body).await;
        }

        let user = self.service.describe_user(self.user_id).await;
        let event = TypingEvent {
            user_id: self.user_id.value(),
            room_id: self.meeting_id.value(),
            is_typing: payload.is_typing,
            user: user.into(),
        };
        self.broadcast(&OutboundFrame::Typing(event)).await;
    }

    async fn on_history(&self, payload: HistoryPayload) {
        if let Err(body) = self.check_room(payload.room_id) {
            return self.reply_error(body).await;
        }

        let offset = usize::try_from(payload.offset).unwrap_or(0);
        let page = match self
            .service
            .fetch_history_page(self.meeting_id, offset, self.history_page_size)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch history of meeting {}: {}",
                    self.meeting_id,
                    e
                );
                return self
                    .reply_error(service_error(ErrorCode::HistoryFailed, &e))
                    .await;
            }
        };

        let history = HistoryPage {
            room_id: self.meeting_id.value(),
            messages: message_events(&self.service, page.messages).await,
            has_more: page.has_more,
            offset: page.next_offset,
        };
        self.reply(&OutboundFrame::History(history)).await;
    }

    fn check_room(&self, room_id: i64) -> Result<(), ErrorBody> {
        if room_id == self.meeting_id.value() {
            return Ok(());
        }
        Err(ErrorBody::new(
            ErrorCode::RoomMismatch,
            format!("Expected: {}, Got: {}", self.meeting_id, room_id),
        ))
    }

    async fn broadcast(&self, frame: &OutboundFrame) {
        self.broadcast_to(self.meeting_id, frame).await;
    }

    async fn broadcast_to(&self, meeting_id: MeetingId, frame: &OutboundFrame) {
        match encode_frame(frame) {
            Ok(encoded) => self.service.broadcast_message(meeting_id, encoded).await,
            Err(e) => tracing::error!("Failed to encode broadcast frame: {}", e),
        }
    }

    async fn reply_error(&self, body: ErrorBody) {
        self.reply(&OutboundFrame::Error(body)).await;
    }

    async fn reply(&self, frame: &OutboundFrame) {
        let encoded = match encode_frame(frame) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!("Failed to encode reply frame: {}", e);
                return;
            }
        };
        if self.direct.send(encoded).await.is_err() {
            tracing::debug!(
                "Connection {} is closing, reply dropped",
                self.connection_id
            );
        }
    }
}

#[async_trait]
impl FrameHandler for Session {
    async fn handle_frame(&self, frame: &[u8]) {
        let inbound = match decode_frame(frame) {
            Ok(inbound) => inbound,
            Err(e) => {
                tracing::debug!("Undecodable frame from connection {}: {}", self.connection_id, e);
                return self.reply_error(e.to_error_body()).await;
            }
        };

        match inbound {
            InboundFrame::Message(payload) => self.on_message(payload).await,
            InboundFrame::Reaction(payload) => self.on_reaction(payload).await,
            InboundFrame::Typing(payload) => self.on_typing(payload).await,
            InboundFrame::History(payload) => self.on_history(payload).await,
            InboundFrame::Unrecognized(kind) => {
                tracing::debug!(
                    "Unknown frame type '{}' from connection {}",
                    kind,
                    self.connection_id
                );
                self.reply_error(ErrorBody::new(
                    ErrorCode::UnknownType,
                    format!("Type: {kind}"),
                ))
                .await;
            }
        }
    }
}

/// Map a chat service failure to the error reply of an operation.
fn service_error(operation: ErrorCode, error: &ChatError) -> ErrorBody {
    let code = match error {
        ChatError::NotFound { .. } => ErrorCode::NotFound,
        ChatError::Forbidden { .. } => ErrorCode::Forbidden,
        _ => operation,
    };
    ErrorBody::new(code, error.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ClientHandle;
    use crate::usecase::test_support::*;

    struct Harness {
        service: Arc<MeetingChatService>,
        session: Session,
        direct_rx: mpsc::Receiver<Frame>,
        hub_rx: mpsc::Receiver<Frame>,
    }

    impl Harness {
        async fn new(join: bool) -> Self {
            let fixture = Fixture::seeded().await;
            let service = Arc::new(fixture.service());
            if join {
                service.join_meeting(MEETING, ALICE).await.unwrap();
            }

            let connection_id = ConnectionId::generate();
            let (hub_tx, hub_rx) = mpsc::channel(16);
            service
                .register_client(
                    MEETING,
                    ClientHandle {
                        connection_id,
                        user_id: ALICE,
                        sender: hub_tx,
                    },
                )
                .await
                .unwrap();
            let (direct_tx, direct_rx) = mpsc::channel(16);
            let session = Session::new(
                service.clone(),
                MEETING,
                ALICE,
                connection_id,
                direct_tx,
                50,
            );

            Self {
                service,
                session,
                direct_rx,
                hub_rx,
            }
        }

        async fn send(&self, frame: Value) {
            self.session.handle_frame(frame.to_string().as_bytes()).await;
        }

        fn next_reply(&mut self) -> Value {
            let frame = self.direct_rx.try_recv().expect("a direct reply");
            serde_json::from_str(&frame).unwrap()
        }

        async fn next_broadcast(&mut self) -> Value {
            let frame = self.hub_rx.recv().await.expect("a broadcast frame");
            serde_json::from_str(&frame).unwrap()
        }

        /// 直前の操作が何も配信していないことを確認する
        async fn assert_no_broadcast(&mut self) {
            self.service
                .broadcast_message(MEETING, Frame::from("\"sentinel\""))
                .await;
            assert_eq!(self.next_broadcast().await, json!("sentinel"));
        }
    }

    #[tokio::test]
    async fn test_unknown_type_gets_one_error_then_processing_continues() {
        // テスト項目: 未知の type には UNKNOWN_TYPE を1回だけ返し、続く message は処理される
        // given (前提条件):
        let mut harness = Harness::new(true).await;

        // when (操作):
        harness.send(json!({"type": "bogus", "data": {}})).await;
        harness
            .send(json!({"type": "message", "data": {"room_id": 7, "content": "hi"}}))
            .await;

        // then (期待する結果):
        let reply = harness.next_reply();
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["data"]["code"], "UNKNOWN_TYPE");
        assert_eq!(reply["data"]["details"], "Type: bogus");
        assert!(harness.direct_rx.try_recv().is_err());

        let broadcast = harness.next_broadcast().await;
        assert_eq!(broadcast["type"], "message");
        assert_eq!(broadcast["data"]["content"], "hi");
        assert_eq!(broadcast["data"]["user_id"], 1);
        assert_eq!(broadcast["data"]["user"]["name"], "Alice");
        assert_eq!(broadcast["data"]["type"], "text");
    }

    #[tokio::test]
    async fn test_malformed_json_gets_invalid_format() {
        // テスト項目: JSON として壊れたフレームには INVALID_FORMAT を返す
        // given (前提条件):
        let mut harness = Harness::new(true).await;

        // when (操作):
        harness.session.handle_frame(b"{oops").await;

        // then (期待する結果):
        let reply = harness.next_reply();
        assert_eq!(reply["data"]["code"], "INVALID_FORMAT");
        assert_eq!(reply["data"]["message"], "Invalid message format");
    }

    #[tokio::test]
    async fn test_room_mismatch_is_rejected() {
        // テスト項目: 接続先と異なる room_id は ROOM_MISMATCH になり配信されない
        // given (前提条件):
        let mut harness = Harness::new(true).await;

        // when (操作):
        harness
            .send(json!({"type": "typing", "data": {"room_id": 8, "is_typing": true}}))
            .await;

        // then (期待する結果):
        let reply = harness.next_reply();
        assert_eq!(reply["data"]["code"], "ROOM_MISMATCH");
        assert_eq!(reply["data"]["details"], "Expected: 7, Got: 8");
        harness.assert_no_broadcast().await;
    }

    #[tokio::test]
    async fn test_non_participant_message_is_forbidden() {
        // テスト項目: 参加していないユーザーの message は FORBIDDEN になり配信されない
        // given (前提条件):
        let mut harness = Harness::new(false).await;

        // when (操作):
        harness
            .send(json!({"type": "message", "data": {"room_id": 7, "content": "sneaky"}}))
            .await;

        // then (期待する結果):
        let reply = harness.next_reply();
        assert_eq!(reply["data"]["code"], "FORBIDDEN");
        harness.assert_no_broadcast().await;
    }

    #[tokio::test]
    async fn test_reaction_action_and_emoji_validation() {
        // テスト項目: 不正な action は INVALID_REACTION_ACTION、空の絵文字は INVALID_REACTION_DATA
        // given (前提条件):
        let mut harness = Harness::new(true).await;

        // when (操作):
        harness
            .send(json!({"type": "reaction", "data": {"message_id": 1, "emoji": "👍", "action": "toggle"}}))
            .await;
        harness
            .send(json!({"type": "reaction", "data": {"message_id": 1, "emoji": "  ", "action": "add"}}))
            .await;

        // then (期待する結果):
        let first = harness.next_reply();
        assert_eq!(first["data"]["code"], "INVALID_REACTION_ACTION");
        assert_eq!(first["data"]["details"], "Action: toggle");
        let second = harness.next_reply();
        assert_eq!(second["data"]["code"], "INVALID_REACTION_DATA");
    }

    #[tokio::test]
    async fn test_reaction_is_broadcast_as_added() {
        // テスト項目: リアクションの追加が action "added" で配信される
        // given (前提条件):
        let mut harness = Harness::new(true).await;
        harness
            .send(json!({"type": "message", "data": {"room_id": 7, "content": "vote"}}))
            .await;
        let message = harness.next_broadcast().await;
        let message_id = message["data"]["id"].as_i64().unwrap();

        // when (操作):
        harness
            .send(json!({"type": "reaction", "data": {"message_id": message_id, "emoji": "👍", "action": "add"}}))
            .await;

        // then (期待する結果):
        let reaction = harness.next_broadcast().await;
        assert_eq!(reaction["type"], "reaction");
        assert_eq!(reaction["data"]["action"], "added");
        assert_eq!(reaction["data"]["emoji"], "👍");
        assert_eq!(reaction["data"]["user"]["username"], "alice");
    }

    #[tokio::test]
    async fn test_reaction_on_unknown_message_is_not_found() {
        // テスト項目: 存在しないメッセージへのリアクションは NOT_FOUND
        // given (前提条件):
        let mut harness = Harness::new(true).await;

        // when (操作):
        harness
            .send(json!({"type": "reaction", "data": {"message_id": 404, "emoji": "👍", "action": "remove"}}))
            .await;

        // then (期待する結果):
        assert_eq!(harness.next_reply()["data"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_history_is_replied_only_to_requester() {
        // テスト項目: history の応答は要求した接続だけに返り、配信されない
        // given (前提条件):
        let mut harness = Harness::new(true).await;
        for content in ["one", "two"] {
            harness
                .send(json!({"type": "message", "data": {"room_id": 7, "content": content}}))
                .await;
            harness.next_broadcast().await;
        }

        // when (操作):
        harness
            .send(json!({"type": "history", "data": {"room_id": 7}}))
            .await;

        // then (期待する結果):
        let reply = harness.next_reply();
        assert_eq!(reply["type"], "history");
        assert_eq!(reply["data"]["has_more"], false);
        assert_eq!(reply["data"]["offset"], 2);
        assert_eq!(reply["data"]["messages"][0]["content"], "two");
        assert_eq!(reply["data"]["messages"][1]["user"]["name"], "Alice");
        harness.assert_no_broadcast().await;
    }

    #[tokio::test]
    async fn test_negative_history_offset_returns_first_page() {
        // テスト項目: 負の offset は 0 として扱われ、先頭ページが返る
        // given (前提条件):
        let mut harness = Harness::new(true).await;
        harness
            .send(json!({"type": "message", "data": {"room_id": 7, "content": "only"}}))
            .await;
        harness.next_broadcast().await;

        // when (操作):
        harness
            .send(json!({"type": "history", "data": {"room_id": 7, "offset": -5}}))
            .await;

        // then (期待する結果):
        let reply = harness.next_reply();
        assert_eq!(reply["type"], "history");
        assert_eq!(reply["data"]["offset"], 1);
        assert_eq!(reply["data"]["has_more"], false);
        assert_eq!(reply["data"]["messages"][0]["content"], "only");
    }

    #[tokio::test]
    async fn test_leave_is_announced_for_last_connection() {
        // テスト項目: ユーザーの最後の接続が閉じるときは room / leave が配信される
        // given (前提条件):
        let mut harness = Harness::new(true).await;

        // when (操作):
        harness.session.announce_leave().await;

        // then (期待する結果):
        let event = harness.next_broadcast().await;
        assert_eq!(event["type"], "room");
        assert_eq!(event["data"]["action"], "leave");
        assert_eq!(event["data"]["user_id"], 1);
    }

    #[tokio::test]
    async fn test_leave_is_not_announced_while_other_connection_remains() {
        // テスト項目: 同じユーザーの別の接続が残っている間は leave を配信しない
        // given (前提条件):
        let mut harness = Harness::new(true).await;
        let (other_tx, _other_rx) = mpsc::channel(16);
        harness
            .service
            .register_client(
                MEETING,
                ClientHandle {
                    connection_id: ConnectionId::generate(),
                    user_id: ALICE,
                    sender: other_tx,
                },
            )
            .await
            .unwrap();

        // when (操作):
        harness.session.announce_leave().await;

        // then (期待する結果):
        harness.assert_no_broadcast().await;
    }

    #[tokio::test]
    async fn test_announce_broadcasts_room_event() {
        // テスト項目: 入室通知が room / join として配信される
        // given (前提条件):
        let mut harness = Harness::new(true).await;

        // when (操作):
        harness.session.announce(RoomAction::Join).await;

        // then (期待する結果):
        let event = harness.next_broadcast().await;
        assert_eq!(event["type"], "room");
        assert_eq!(event["data"]["action"], "join");
        assert_eq!(event["data"]["room_id"], 7);
        assert_eq!(event["data"]["user"]["username"], "alice");
    }
}
