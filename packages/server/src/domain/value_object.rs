//! 値オブジェクト
//!
//! 識別子・メッセージ本文・タイムスタンプ・ルームキーを型で表現し、
//! 生成時にバリデーションを行います。不正な値は `ValueObjectError` になります。

use std::{fmt, str::FromStr};

use uuid::Uuid;

use super::error::ValueObjectError;

/// メッセージ本文の最大文字数
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// 空文字列を許さない文字列 ID を定義する
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// 文字列から生成（空白のみは不可）
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                if value.trim().is_empty() {
                    return Err(ValueObjectError::EmptyId($label));
                }
                Ok(Self(value))
            }

            /// UUID v4 で新規採番
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValueObjectError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// ユーザー ID（認証トークンの `sub`）
    UserId,
    "user id"
);
string_id!(
    /// チャット ID
    ChatId,
    "chat id"
);
string_id!(
    /// グループ ID
    GroupId,
    "group id"
);
string_id!(
    /// メッセージ ID（永続化時に採番される）
    MessageId,
    "message id"
);

/// コネクション ID
///
/// トランスポート層の接続ごとに一意。外部から与えられることはなく、
/// 認証成功時にサーバー側で採番します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// メッセージ本文
///
/// 前後の空白を除いて空でないこと、`MAX_MESSAGE_LENGTH` 文字以下であることを保証します。
/// 本文そのものは解釈せず、受け取った文字列をそのまま保持します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyContent);
        }
        let length = value.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(ValueObjectError::ContentTooLong {
                max: MAX_MESSAGE_LENGTH,
                actual: length,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// ルームキー
///
/// ルームはブロードキャストの宛先グループで、永続化されません。
/// 文字列表現は `user:<userId>`（個人ルーム）と `chat:<chatId>`（チャットルーム）。
/// ダイレクトチャットもグループチャットも 1 チャット 1 ルームで配信します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomKey {
    /// ユーザー個人宛てのルーム
    User(UserId),
    /// チャット単位のルーム
    Chat(ChatId),
}

impl RoomKey {
    const USER_PREFIX: &'static str = "user:";
    const CHAT_PREFIX: &'static str = "chat:";

    pub fn user(user_id: &UserId) -> Self {
        Self::User(user_id.clone())
    }

    pub fn chat(chat_id: &ChatId) -> Self {
        Self::Chat(chat_id.clone())
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "{}{}", Self::USER_PREFIX, id),
            Self::Chat(id) => write!(f, "{}{}", Self::CHAT_PREFIX, id),
        }
    }
}

impl FromStr for RoomKey {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValueObjectError::InvalidRoomKey(s.to_string());
        if let Some(rest) = s.strip_prefix(Self::USER_PREFIX) {
            UserId::try_from(rest).map(Self::User).map_err(|_| invalid())
        } else if let Some(rest) = s.strip_prefix(Self::CHAT_PREFIX) {
            ChatId::try_from(rest).map(Self::Chat).map_err(|_| invalid())
        } else {
            Err(invalid())
        }
    }
}
