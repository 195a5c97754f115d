//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        create_chat, debug_presence, get_chat, get_messages, health_check, list_chats,
        mark_as_read, send_message, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Path of the realtime endpoint
pub const WEBSOCKET_PATH: &str = "/ws/chat";

/// Real-time chat server
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(AppState::new(repository, token_verifier, clock, 256));
/// Server::new(state).run("127.0.0.1", 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Build the router with every endpoint
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route(WEBSOCKET_PATH, get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/debug/presence/{user_id}", get(debug_presence))
            .route("/chat", get(list_chats).post(create_chat))
            .route("/chat/send", post(send_message))
            .route("/chat/{chat_id}", get(get_chat))
            .route("/chat/{chat_id}/messages", get(get_messages))
            .route("/chat/{chat_id}/read", post(mark_as_read))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to `host:port` and serve until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}{}", bind_addr, WEBSOCKET_PATH);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener).await?;
        Ok(())
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        tracing::info!(
            "Tabichat server listening on {}",
            listener.local_addr()?
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
