//! UseCase 層
//!
//! 各操作をドメイン層の trait とインメモリの接続状態に対して実装します。

pub mod access;
pub mod bootstrap_chat;
pub mod connect_session;
pub mod disconnect_session;
pub mod error;
pub mod get_presence;
pub mod join_chat;
pub mod mark_as_read;
pub mod query_chats;
pub mod send_message;
pub mod typing;

pub use bootstrap_chat::BootstrapChatUseCase;
pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::ChatError;
pub use get_presence::{GetPresenceUseCase, Presence};
pub use join_chat::JoinChatUseCase;
pub use mark_as_read::MarkAsReadUseCase;
pub use query_chats::QueryChatsUseCase;
pub use send_message::{Delivery, SendMessageUseCase};
pub use typing::TypingUseCase;
