//! Command-line configuration.

use std::time::Duration;

use clap::Parser;

use crate::infrastructure::message_pusher::HubSettings;

/// Real-time meeting chat server
#[derive(Parser, Debug, Clone)]
#[command(name = "parley-server")]
#[command(about = "Real-time meeting chat server", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    pub port: u16,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    pub log_level: String,

    /// Capacity of each connection's hub-fed outbound queue
    #[arg(long, default_value_t = 256)]
    pub outbound_queue_capacity: usize,

    /// Capacity of each hub's command queue
    #[arg(long, default_value_t = 256)]
    pub hub_command_capacity: usize,

    /// Seconds between keepalive pings
    #[arg(long, default_value_t = 50)]
    pub ping_interval_secs: u64,

    /// Seconds to wait for a pong before dropping the connection
    #[arg(long, default_value_t = 60)]
    pub pong_wait_secs: u64,

    /// Seconds a single socket write may take
    #[arg(long, default_value_t = 10)]
    pub write_wait_secs: u64,

    /// Maximum inbound WebSocket message size in bytes
    #[arg(long, default_value_t = 512)]
    pub max_message_size: usize,

    /// Messages per history page
    #[arg(long, default_value_t = 50)]
    pub history_page_size: usize,

    /// Seconds an empty hub is kept before it is evicted
    #[arg(long, default_value_t = 30)]
    pub hub_idle_grace_secs: u64,

    /// Seed demo users (1-3) and meeting 1 into the in-memory store
    #[arg(long)]
    pub seed_demo: bool,
}

impl ServerConfig {
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            outbound_queue_capacity: self.outbound_queue_capacity.max(1),
            ping_interval: Duration::from_secs(self.ping_interval_secs.max(1)),
            pong_wait: Duration::from_secs(self.pong_wait_secs.max(1)),
            write_wait: Duration::from_secs(self.write_wait_secs.max(1)),
            max_message_size: self.max_message_size,
            history_page_size: self.history_page_size.max(1),
            ..ConnectionSettings::default()
        }
    }

    pub fn hub_settings(&self) -> HubSettings {
        HubSettings {
            command_capacity: self.hub_command_capacity.max(1),
            idle_grace: Duration::from_secs(self.hub_idle_grace_secs.max(1)),
        }
    }
}

/// Per-connection limits and timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub outbound_queue_capacity: usize,
    /// Capacity of the queue for replies addressed to this connection only
    pub direct_queue_capacity: usize,
    pub ping_interval: Duration,
    pub pong_wait: Duration,
    pub write_wait: Duration,
    pub max_message_size: usize,
    pub history_page_size: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: 256,
            direct_queue_capacity: 32,
            ping_interval: Duration::from_secs(50),
            pong_wait: Duration::from_secs(60),
            write_wait: Duration::from_secs(10),
            max_message_size: 512,
            history_page_size: 50,
        }
    }
}
