//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクト生成時のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    EmptyId(&'static str),

    #[error("message content must not be blank")]
    EmptyContent,

    #[error("message content exceeds {max} characters (got {actual})")]
    ContentTooLong { max: usize, actual: usize },

    #[error("invalid room key: '{0}'")]
    InvalidRoomKey(String),
}

/// 永続化コラボレーター（ChatRepository）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("chat '{0}' not found")]
    ChatNotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// MessagePusher のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),

    /// 送信キューが満杯。該当コネクションは切断対象になる
    #[error("outbound queue of connection '{0}' is full")]
    QueueFull(String),

    #[error("outbound channel of connection '{0}' is closed")]
    ChannelClosed(String),

    #[error("failed to encode event: {0}")]
    Encode(String),
}

/// 認証トークン検証のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing session token")]
    MissingToken,

    #[error("session token expired")]
    Expired,

    #[error("invalid session token: {0}")]
    InvalidToken(String),
}
