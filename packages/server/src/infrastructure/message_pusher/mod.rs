//! MessagePusher 実装
//!
//! ミーティングごとの Hub と、それを束ねる `HubRegistry` を提供します。

mod hub;
mod registry;

pub use hub::{HubHandle, HubStopped};
pub use registry::{HubRegistry, HubSettings};
