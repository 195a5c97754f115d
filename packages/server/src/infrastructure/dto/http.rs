//! HTTP API request / response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::MessageDto;

/// `POST /chat`
///
/// Exactly one of `userId` (direct chat) or `groupId` (group chat) is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

/// `POST /chat/send`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub chat_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatTypeDto {
    Direct,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDto {
    pub id: String,
    pub r#type: ChatTypeDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user1_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user2_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// RFC 3339 (JST)
    pub created_at: String,
    /// RFC 3339 (JST)
    pub updated_at: String,
}

/// `GET /chat/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDetailDto {
    #[serde(flatten)]
    pub chat: ChatDto,
    pub messages: Vec<MessageDto>,
}

/// `POST /chat/{id}/read`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadResponse {
    pub message: String,
    pub updated: usize,
}

/// `GET /debug/presence/{user_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceStatusDto {
    pub user_id: String,
    pub online: bool,
    pub connections: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_connection: Option<String>,
}

/// Error body shared by every HTTP endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
