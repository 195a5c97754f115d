//! ドメイン層
//!
//! 値オブジェクト・エンティティと、UseCase 層が依存するコラボレーターの trait を定義します。

pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod repository;
pub mod token_verifier;
pub mod value_object;

pub use entity::{Chat, ChatKind, Connection, GroupMemberStatus, Message};
pub use error::{AuthError, MessagePushError, RepositoryError, ValueObjectError};
pub use event::OutboundEvent;
pub use message_pusher::{BroadcastReport, EvictionSignal, MessagePusher, PusherChannel};
pub use repository::ChatRepository;
pub use token_verifier::TokenVerifier;
pub use value_object::{
    ChatId, ConnectionId, GroupId, MAX_MESSAGE_LENGTH, MessageContent, MessageId, RoomKey,
    Timestamp, UserId,
};

#[cfg(test)]
pub use repository::MockChatRepository;
#[cfg(test)]
pub use token_verifier::MockTokenVerifier;
