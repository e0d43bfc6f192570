//! Real-time meeting chat server library.
//!
//! Provides the per-meeting broadcast hub, the lifecycle of live WebSocket
//! connections, the chat protocol codec and the chat service that persists
//! messages and reactions behind participant authorization.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
