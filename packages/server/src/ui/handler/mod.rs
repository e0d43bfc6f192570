//! HTTP and WebSocket handlers.

mod http;
mod websocket;

pub use http::{
    debug_meeting_connections, get_meeting_messages, health_check, join_meeting, leave_meeting,
};
pub use websocket::websocket_handler;
