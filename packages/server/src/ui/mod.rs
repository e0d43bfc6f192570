//! Meeting chat server UI layer (HTTP + WebSocket).

mod connection;
mod handler;
mod identity;
mod presenter;
mod server;
mod session;
mod signal;
pub mod state;

pub use connection::TransportFault;
pub use identity::{Identity, USER_ID_HEADER};
pub use server::Server;
