mod attachment;
mod meeting;
mod message;
mod reaction;
mod user;

pub use attachment::InMemoryAttachmentRepository;
pub use meeting::InMemoryMeetingRepository;
pub use message::InMemoryMessageRepository;
pub use reaction::InMemoryReactionRepository;
pub use user::InMemoryUserRepository;
