//! UI layer: axum WebSocket and HTTP surface.

pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use server::{Server, WEBSOCKET_PATH};
pub use state::AppState;
