//! Request handlers.

pub mod auth;
pub mod error;
pub mod http;
pub mod websocket;

pub use http::{
    create_chat, debug_presence, get_chat, get_messages, health_check, list_chats, mark_as_read,
    send_message,
};
pub use websocket::websocket_handler;
