//! Domain layer
//!
//! ミーティングチャットの値オブジェクト・エンティティ・エラー、
//! およびデータアクセスと配信の抽象（trait）を定義します。

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{
    Attachment, AttachmentUpload, Meeting, Message, MessageKind, NewAttachment, NewMessage,
    NewReaction, Participant, Reaction, ReactionAction, ReactionChange, User,
};
pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use message_pusher::{ClientHandle, Frame, MemberInfo, MessagePusher, PusherChannel};
pub use repository::{
    AttachmentRepository, MeetingRepository, MessageRepository, ReactionRepository,
    UserRepository,
};
#[cfg(test)]
pub use repository::{
    MockAttachmentRepository, MockMeetingRepository, MockMessageRepository,
    MockReactionRepository, MockUserRepository,
};
pub use value_object::{
    AttachmentId, ConnectionId, Emoji, MeetingId, MessageId, ReactionId, UserId,
};
