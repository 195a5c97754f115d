//! Real-time delivery and presence engine for Tabichat.
//!
//! Tracks authenticated WebSocket connections, their room memberships, and fans
//! chat messages, typing indicators and presence changes out to the connections
//! that should see them. Chats and messages themselves live behind the
//! [`domain::ChatRepository`] collaborator.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
