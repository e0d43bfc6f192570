//! Repository 実装
//!
//! 現在はインメモリ実装のみ提供します。

pub mod inmemory;

pub use inmemory::{
    InMemoryAttachmentRepository, InMemoryMeetingRepository, InMemoryMessageRepository,
    InMemoryReactionRepository, InMemoryUserRepository,
};
