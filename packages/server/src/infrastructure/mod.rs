//! Infrastructure layer
//!
//! Domain 層の trait の具体的な実装（Repository, MessagePusher）と、
//! 通信プロトコルの DTO を提供します。

pub mod dto;
pub mod message_pusher;
pub mod repository;
