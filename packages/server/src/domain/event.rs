//! コネクションへ送り出すイベント
//!
//! UseCase 層はこの型でイベントを組み立て、ワイヤー形式（JSON）への変換は
//! MessagePusher の実装が担います。

use super::{ChatId, Message, UserId};

/// 送信イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// ルームへの新着メッセージ（`message:new`）
    MessageNew(Message),
    /// 送信元コネクションへの送信完了通知（`message:sent`）
    MessageSent(Message),
    /// 入力中開始（`typing:start`）
    TypingStarted { chat_id: ChatId, user_id: UserId },
    /// 入力中終了（`typing:stop`）
    TypingStopped { chat_id: ChatId, user_id: UserId },
    /// オンライン（`user:online`）
    UserOnline(UserId),
    /// オフライン（`user:offline`）
    UserOffline(UserId),
    /// 受信イベントの成功応答
    Ack {
        event: &'static str,
        chat_id: Option<ChatId>,
    },
    /// 受信イベントの失敗応答（送信元コネクションのみ）
    Error {
        event: Option<String>,
        code: &'static str,
        message: String,
    },
}
