//! HTTP API endpoint handlers.
//!
//! Every `/chat` endpoint requires `Authorization: Bearer <token>` and runs the
//! same use cases as the realtime surface. `POST /chat/send` fans the message
//! out to the chat's room exactly like `message:send` does.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    domain::{ChatId, GroupId, UserId},
    infrastructure::dto::{
        http::{
            ChatDetailDto, ChatDto, CreateChatRequest, MarkAsReadResponse, PresenceStatusDto,
            SendMessageRequest,
        },
        websocket::MessageDto,
    },
    ui::state::AppState,
    usecase::ChatError,
};

use super::{auth::AuthenticatedUser, error::ApiError};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint to get the presence of a user (for testing purposes)
pub async fn debug_presence(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<PresenceStatusDto>, ApiError> {
    let user_id = UserId::new(user_id).map_err(ChatError::from)?;
    let presence = state.get_presence_usecase.execute(user_id);

    Ok(Json(PresenceStatusDto {
        online: presence.is_online(),
        connections: presence.connections.len(),
        canonical_connection: presence.canonical_connection.map(|id| id.to_string()),
        user_id: presence.user_id.into_string(),
    }))
}

/// Chat ids in paths are store-issued UUIDs; anything else is a bad request
fn parse_chat_id(raw: String) -> Result<ChatId, ApiError> {
    if Uuid::parse_str(&raw).is_err() {
        return Err(ChatError::InvalidPayload(format!("chat id '{}' is not a UUID", raw)).into());
    }
    Ok(ChatId::new(raw).map_err(ChatError::from)?)
}

/// `POST /chat`: open (or fetch) a direct chat with `userId` or the chat of `groupId`
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    payload: Result<Json<CreateChatRequest>, JsonRejection>,
) -> Result<Json<ChatDto>, ApiError> {
    let Json(request) = payload?;

    let chat = match (request.user_id, request.group_id) {
        (Some(other), None) => {
            let other = UserId::new(other).map_err(ChatError::from)?;
            state
                .bootstrap_chat_usecase
                .open_direct_chat(&user_id, &other)
                .await?
        }
        (None, Some(group_id)) => {
            let group_id = GroupId::new(group_id).map_err(ChatError::from)?;
            state
                .bootstrap_chat_usecase
                .open_group_chat(&user_id, &group_id)
                .await?
        }
        _ => {
            return Err(ChatError::InvalidPayload(
                "exactly one of userId or groupId is required".to_string(),
            )
            .into());
        }
    };

    Ok(Json(chat.into()))
}

/// `GET /chat`: chats of the caller, most recently active first
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<Vec<ChatDto>>, ApiError> {
    let chats = state.query_chats_usecase.list_chats(&user_id).await?;
    Ok(Json(chats.into_iter().map(ChatDto::from).collect()))
}

/// `GET /chat/{chat_id}`: chat with its messages
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(chat_id): Path<String>,
) -> Result<Json<ChatDetailDto>, ApiError> {
    let chat_id = parse_chat_id(chat_id)?;
    let (chat, messages) = state
        .query_chats_usecase
        .get_chat(&user_id, &chat_id)
        .await?;

    Ok(Json(ChatDetailDto {
        chat: chat.into(),
        messages: messages.into_iter().map(MessageDto::from).collect(),
    }))
}

/// `GET /chat/{chat_id}/messages`: history, oldest first
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(chat_id): Path<String>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let chat_id = parse_chat_id(chat_id)?;
    let messages = state
        .query_chats_usecase
        .get_messages(&user_id, &chat_id)
        .await?;
    Ok(Json(messages.into_iter().map(MessageDto::from).collect()))
}

/// `POST /chat/send`: persist a message and fan it out to the chat's room
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let Json(request) = payload?;
    let (chat_id, content) = request.into_domain().map_err(ChatError::from)?;

    let delivery = state
        .send_message_usecase
        .execute(&user_id, &chat_id, content)
        .await?;

    Ok((StatusCode::CREATED, Json(delivery.message.into())))
}

/// `POST /chat/{chat_id}/read`: mark the other participants' messages as read
pub async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(chat_id): Path<String>,
) -> Result<Json<MarkAsReadResponse>, ApiError> {
    let chat_id = parse_chat_id(chat_id)?;
    let updated = state
        .mark_as_read_usecase
        .execute(&user_id, &chat_id)
        .await?;

    Ok(Json(MarkAsReadResponse {
        message: "Messages marked as read".to_string(),
        updated,
    }))
}
