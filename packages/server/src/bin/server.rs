//! Real-time meeting chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parley-server
//! cargo run --bin parley-server -- --host 0.0.0.0 --port 3000 --seed-demo
//! ```

use std::sync::Arc;

use chrono::Duration;
use clap::Parser;
use parley_server::{
    config::ServerConfig,
    domain::{Meeting, MeetingId, User, UserId},
    infrastructure::{
        message_pusher::HubRegistry,
        repository::{
            InMemoryAttachmentRepository, InMemoryMeetingRepository, InMemoryMessageRepository,
            InMemoryReactionRepository, InMemoryUserRepository,
        },
    },
    ui::Server,
    usecase::{MeetingChatService, Repositories},
};
use parley_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. Hub registry (MessagePusher)
    // 3. Chat service
    // 4. Server

    // 1. Create Repositories (in-memory database)
    let meetings = Arc::new(InMemoryMeetingRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    if config.seed_demo {
        seed_demo(&meetings, &users, clock.as_ref()).await;
    }
    let repositories = Repositories {
        meetings,
        messages: Arc::new(InMemoryMessageRepository::new()),
        attachments: Arc::new(InMemoryAttachmentRepository::new()),
        reactions: Arc::new(InMemoryReactionRepository::new()),
        users,
    };

    // 2. Create the hub registry
    let registry = Arc::new(HubRegistry::new(config.hub_settings()));

    // 3. Create the chat service
    let chat_service = Arc::new(MeetingChatService::new(repositories, registry, clock));

    // 4. Create and run the server
    let server = Server::new(chat_service, config.connection_settings());
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Users 1-3 and meeting 1, for trying the server without the rest of the backend
async fn seed_demo(
    meetings: &InMemoryMeetingRepository,
    users: &InMemoryUserRepository,
    clock: &dyn Clock,
) {
    let demo_users = [(1, "Alice", "alice"), (2, "Bob", "bob"), (3, "Carol", "carol")];
    for (id, name, username) in demo_users {
        users
            .insert_user(User {
                id: UserId::new(id),
                name: name.to_string(),
                username: username.to_string(),
                avatar_url: None,
            })
            .await;
    }

    let start_time = clock.now();
    meetings
        .insert_meeting(Meeting {
            id: MeetingId::new(1),
            name: "Demo meeting".to_string(),
            channel_id: 1,
            creator_id: UserId::new(1),
            start_time,
            end_time: start_time + Duration::hours(8),
        })
        .await;
    tracing::info!("Seeded demo meeting 1 with users 1-3");
}
