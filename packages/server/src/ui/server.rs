//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{config::ConnectionSettings, usecase::MeetingChatService};

use super::{
    handler::{
        debug_meeting_connections, get_meeting_messages, health_check, join_meeting,
        leave_meeting, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Meeting chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(chat_service, ConnectionSettings::default());
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// MeetingChatService（チャットのユースケース）
    chat_service: Arc<MeetingChatService>,
    settings: ConnectionSettings,
}

impl Server {
    pub fn new(chat_service: Arc<MeetingChatService>, settings: ConnectionSettings) -> Self {
        Self {
            chat_service,
            settings,
        }
    }

    /// Build the application router
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            chat_service: self.chat_service.clone(),
            settings: self.settings,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws/meetings/{meeting_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route(
                "/api/meetings/{meeting_id}/messages",
                get(get_meeting_messages),
            )
            .route("/api/meetings/{meeting_id}/join", post(join_meeting))
            .route("/api/meetings/{meeting_id}/leave", post(leave_meeting))
            .route(
                "/debug/meetings/{meeting_id}/connections",
                get(debug_meeting_connections),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Serve on an already bound listener until `shutdown` resolves, then stop every hub.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        // Closing every hub closes the outbound queues, which ends the live connections.
        self.chat_service.shutdown().await;
        result
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Meeting chat server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws/meetings/{{meeting_id}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
