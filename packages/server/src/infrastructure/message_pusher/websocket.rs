//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - コネクションごとの送信キュー（容量付き `mpsc::Sender`）を管理
//! - `OutboundEvent` を JSON に変換して送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! UI 層は受信側（`Receiver`）を読み出してソケットへ書き込むタスクを持ち、
//! この実装は送信側（`Sender`）だけを保持します。
//!
//! ## バックプレッシャー
//!
//! 送信は `try_send` で行い、ソケットへの書き込みを待たない。キューが満杯のコネクションは
//! 追い付けない購読者とみなし、送信キューを破棄したうえで切り離しを通知する。
//! 書き込みタスクは詰まったソケットで止まっているため、キューが閉じるのを待たずに
//! UI 層が通知を受けて切断処理を走らせる。

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc::error::TrySendError;

use crate::{
    domain::{
        BroadcastReport, ConnectionId, MessagePushError, MessagePusher, OutboundEvent,
        PusherChannel,
    },
    infrastructure::dto::websocket::ServerEvent,
};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// let (channel, rx, eviction) = PusherChannel::bounded(256);
/// pusher.register_connection(connection_id, channel).await;
///
/// pusher.push_to(&connection_id, &OutboundEvent::UserOnline(user_id)).await?;
/// ```
#[derive(Debug, Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のコネクションの送信キュー
    ///
    /// Key: ConnectionId
    /// Value: PusherChannel
    channels: DashMap<ConnectionId, PusherChannel>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中のコネクション数
    pub fn connection_count(&self) -> usize {
        self.channels.len()
    }

    fn encode(event: &OutboundEvent) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerEvent::from(event.clone()))
            .map_err(|e| MessagePushError::Encode(e.to_string()))
    }

    /// エンコード済みの JSON を 1 コネクションへ送る
    fn send_encoded(
        &self,
        connection_id: &ConnectionId,
        json: String,
    ) -> Result<(), MessagePushError> {
        // ガードを保持したまま remove しないよう、送信キューを複製してから送る
        let channel = self
            .channels
            .get(connection_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| MessagePushError::ConnectionNotFound(connection_id.to_string()))?;

        match channel.try_send(json) {
            Ok(()) => {
                tracing::debug!("Pushed event to connection '{}'", connection_id);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    "Outbound queue of connection '{}' is full, evicting slow consumer",
                    connection_id
                );
                self.channels.remove(connection_id);
                channel.evict();
                Err(MessagePushError::QueueFull(connection_id.to_string()))
            }
            Err(TrySendError::Closed(_)) => {
                self.channels.remove(connection_id);
                Err(MessagePushError::ChannelClosed(connection_id.to_string()))
            }
        }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.channels.insert(connection_id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        self.channels.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        let json = Self::encode(event)?;
        self.send_encoded(connection_id, json)
    }

    async fn broadcast(&self, targets: &[ConnectionId], event: &OutboundEvent) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        if targets.is_empty() {
            return report;
        }

        let json = match Self::encode(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode broadcast event: {}", e);
                report.failed = targets.len();
                return report;
            }
        };

        for target in targets {
            // ブロードキャストでは一部の送信失敗を許容
            match self.send_encoded(target, json.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!("Failed to push event to connection '{}': {}", target, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
