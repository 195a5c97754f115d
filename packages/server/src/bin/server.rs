//! Tabichat real-time server.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=dev-secret cargo run --bin tabichat-server
//! JWT_SECRET=dev-secret cargo run --bin tabichat-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use tabichat_server::{
    config::ServerConfig,
    infrastructure::{auth::JwtTokenVerifier, repository::InMemoryChatRepository},
    ui::{AppState, Server},
};
use tabichat_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env();

    // Initialize tracing
    setup_logger(&[env!("CARGO_BIN_NAME")], &config.log_level);

    // Initialize dependencies in order:
    // 1. Clock / Repository / TokenVerifier
    // 2. AppState (registries, MessagePusher, UseCases)
    // 3. Server
    let clock = Arc::new(SystemClock);
    let repository = Arc::new(InMemoryChatRepository::new(clock.clone()));
    let token_verifier = Arc::new(JwtTokenVerifier::new(&config.jwt_secret));

    let state = Arc::new(AppState::new(
        repository,
        token_verifier,
        clock,
        config.outbound_queue_capacity,
    ));

    if let Err(e) = Server::new(state).run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
