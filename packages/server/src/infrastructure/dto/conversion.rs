//! Conversion logic between DTOs and domain entities.

use tabichat_shared::time::to_jst_rfc3339;

use crate::domain::{
    Chat, ChatId, ChatKind, Message, MessageContent, OutboundEvent, ValueObjectError,
};
use crate::infrastructure::dto::{
    http::{ChatDto, ChatTypeDto, SendMessageRequest},
    websocket::{
        AckDto, ChatRefPayload, ErrorDto, MessageDto, PresenceDto, SendMessagePayload,
        ServerEvent, TypingDto,
    },
};

// ========================================
// DTO → Domain
// ========================================

impl SendMessagePayload {
    pub fn into_domain(self) -> Result<(ChatId, MessageContent), ValueObjectError> {
        Ok((ChatId::new(self.chat_id)?, MessageContent::new(self.content)?))
    }
}

impl SendMessageRequest {
    pub fn into_domain(self) -> Result<(ChatId, MessageContent), ValueObjectError> {
        Ok((ChatId::new(self.chat_id)?, MessageContent::new(self.content)?))
    }
}

impl ChatRefPayload {
    pub fn chat_id(&self) -> Result<ChatId, ValueObjectError> {
        ChatId::new(self.chat_id.clone())
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<Message> for MessageDto {
    fn from(model: Message) -> Self {
        Self {
            id: model.id.into_string(),
            chat_id: model.chat_id.into_string(),
            sender_id: model.sender_id.into_string(),
            content: model.content.into_string(),
            is_read: model.is_read,
            created_at: to_jst_rfc3339(model.created_at.value()),
        }
    }
}

impl From<Chat> for ChatDto {
    fn from(model: Chat) -> Self {
        let (r#type, user1_id, user2_id, group_id) = match model.kind {
            ChatKind::Direct { user1, user2 } => (
                ChatTypeDto::Direct,
                Some(user1.into_string()),
                Some(user2.into_string()),
                None,
            ),
            ChatKind::Group { group_id } => {
                (ChatTypeDto::Group, None, None, Some(group_id.into_string()))
            }
        };
        Self {
            id: model.id.into_string(),
            r#type,
            user1_id,
            user2_id,
            group_id,
            created_at: to_jst_rfc3339(model.created_at.value()),
            updated_at: to_jst_rfc3339(model.updated_at.value()),
        }
    }
}

impl From<OutboundEvent> for ServerEvent {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::MessageNew(message) => Self::MessageNew(message.into()),
            OutboundEvent::MessageSent(message) => Self::MessageSent(message.into()),
            OutboundEvent::TypingStarted { chat_id, user_id } => Self::TypingStart(TypingDto {
                chat_id: chat_id.into_string(),
                user_id: user_id.into_string(),
            }),
            OutboundEvent::TypingStopped { chat_id, user_id } => Self::TypingStop(TypingDto {
                chat_id: chat_id.into_string(),
                user_id: user_id.into_string(),
            }),
            OutboundEvent::UserOnline(user_id) => Self::UserOnline(PresenceDto {
                user_id: user_id.into_string(),
            }),
            OutboundEvent::UserOffline(user_id) => Self::UserOffline(PresenceDto {
                user_id: user_id.into_string(),
            }),
            OutboundEvent::Ack { event, chat_id } => Self::Ack(AckDto {
                event: event.to_string(),
                chat_id: chat_id.map(ChatId::into_string),
            }),
            OutboundEvent::Error {
                event,
                code,
                message,
            } => Self::Error(ErrorDto {
                event,
                code: code.to_string(),
                message,
            }),
        }
    }
}
