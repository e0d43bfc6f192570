//! Domain → wire presentation helpers shared by the WebSocket session and the HTTP API.

use std::collections::HashMap;

use crate::{
    domain::{Message, User, UserId},
    infrastructure::dto::websocket::MessageEvent,
    usecase::MeetingChatService,
};

/// Convert messages to wire events, resolving each sender once.
pub async fn message_events(
    service: &MeetingChatService,
    messages: Vec<Message>,
) -> Vec<MessageEvent> {
    let mut senders: HashMap<UserId, User> = HashMap::new();
    let mut events = Vec::with_capacity(messages.len());

    for message in messages {
        let sender = match senders.get(&message.sender_id) {
            Some(user) => user.clone(),
            None => {
                let user = service.describe_user(message.sender_id).await;
                senders.insert(message.sender_id, user.clone());
                user
            }
        };
        events.push(MessageEvent::from_domain(message, sender));
    }
    events
}
