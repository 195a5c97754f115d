//! WebSocket message DTOs.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Inbound frames are parsed into [`ClientEvent`]; unknown event names and
//! payloads with missing or unexpected fields fail to parse.

use serde::{Deserialize, Serialize};

/// Inbound (client → server) events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "message:send")]
    SendMessage(SendMessagePayload),
    #[serde(rename = "chat:join")]
    JoinChat(ChatRefPayload),
    #[serde(rename = "chat:leave")]
    LeaveChat(ChatRefPayload),
    #[serde(rename = "typing:start")]
    TypingStart(ChatRefPayload),
    #[serde(rename = "typing:stop")]
    TypingStop(ChatRefPayload),
    #[serde(rename = "message:read")]
    MarkRead(ChatRefPayload),
}

impl ClientEvent {
    pub const SEND_MESSAGE: &'static str = "message:send";
    pub const JOIN_CHAT: &'static str = "chat:join";
    pub const LEAVE_CHAT: &'static str = "chat:leave";
    pub const TYPING_START: &'static str = "typing:start";
    pub const TYPING_STOP: &'static str = "typing:stop";
    pub const MARK_READ: &'static str = "message:read";

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendMessage(_) => Self::SEND_MESSAGE,
            Self::JoinChat(_) => Self::JOIN_CHAT,
            Self::LeaveChat(_) => Self::LEAVE_CHAT,
            Self::TypingStart(_) => Self::TYPING_START,
            Self::TypingStop(_) => Self::TYPING_STOP,
            Self::MarkRead(_) => Self::MARK_READ,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendMessagePayload {
    pub chat_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatRefPayload {
    pub chat_id: String,
}

/// Outbound (server → client) events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "message:new")]
    MessageNew(MessageDto),
    #[serde(rename = "message:sent")]
    MessageSent(MessageDto),
    #[serde(rename = "typing:start")]
    TypingStart(TypingDto),
    #[serde(rename = "typing:stop")]
    TypingStop(TypingDto),
    #[serde(rename = "user:online")]
    UserOnline(PresenceDto),
    #[serde(rename = "user:offline")]
    UserOffline(PresenceDto),
    #[serde(rename = "ack")]
    Ack(AckDto),
    #[serde(rename = "error")]
    Error(ErrorDto),
}

/// Persisted message, shared by the realtime and HTTP surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub content: String,
    pub is_read: bool,
    /// RFC 3339 (JST)
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingDto {
    pub chat_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceDto {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckDto {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_message_event() {
        // テスト項目: message:send イベントをパースできる
        // given (前提条件):
        let raw = r#"{"event":"message:send","data":{"chatId":"c1","content":"hi"}}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(raw).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::SendMessage(SendMessagePayload {
                chat_id: "c1".to_string(),
                content: "hi".to_string(),
            })
        );
        assert_eq!(event.name(), "message:send");
    }

    #[test]
    fn test_parse_chat_ref_events() {
        // テスト項目: chatId だけを持つイベントを種類ごとに区別できる
        // given (前提条件):
        let cases = [
            ("chat:join", "chat:join"),
            ("chat:leave", "chat:leave"),
            ("typing:start", "typing:start"),
            ("typing:stop", "typing:stop"),
            ("message:read", "message:read"),
        ];

        for (wire, expected) in cases {
            // when (操作):
            let raw = format!(r#"{{"event":"{}","data":{{"chatId":"c1"}}}}"#, wire);
            let event: ClientEvent = serde_json::from_str(&raw).unwrap();

            // then (期待する結果):
            assert_eq!(event.name(), expected);
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        // テスト項目: 未知のイベント名はパースエラー
        let raw = r#"{"event":"chat:delete","data":{"chatId":"c1"}}"#;

        assert!(serde_json::from_str::<ClientEvent>(raw).is_err());
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        // テスト項目: 必須フィールドの欠落・余計なフィールドはパースエラー
        let missing = r#"{"event":"message:send","data":{"chatId":"c1"}}"#;
        let extra = r#"{"event":"chat:join","data":{"chatId":"c1","admin":true}}"#;
        let no_data = r#"{"event":"chat:join"}"#;

        assert!(serde_json::from_str::<ClientEvent>(missing).is_err());
        assert!(serde_json::from_str::<ClientEvent>(extra).is_err());
        assert!(serde_json::from_str::<ClientEvent>(no_data).is_err());
    }

    #[test]
    fn test_serialize_ack_without_chat_id() {
        // テスト項目: chatId のない ack はフィールドを省略する
        // given (前提条件):
        let event = ServerEvent::Ack(AckDto {
            event: "message:read".to_string(),
            chat_id: None,
        });

        // when (操作):
        let json = serde_json::to_string(&event).unwrap();

        // then (期待する結果):
        assert_eq!(json, r#"{"event":"ack","data":{"event":"message:read"}}"#);
    }
}
