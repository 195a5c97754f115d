//! MessagePusher trait 定義
//!
//! コネクションへのイベント送信（通知）の抽象化。
//! WebSocket などの具体的なトランスポートは Infrastructure 層が実装します。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{
    Notify,
    mpsc::{self, error::TrySendError},
};

use super::{ConnectionId, MessagePushError, OutboundEvent};

/// コネクションごとの送信キュー
///
/// 容量付きチャンネル。1 コネクションあたりのメモリ使用量に上限を設ける。
/// 送信側は切り離し（evict）の通知も持ち、書き込みタスクが詰まっていても
/// コネクションの持ち主に切断を伝えられる。
#[derive(Debug, Clone)]
pub struct PusherChannel {
    sender: mpsc::Sender<String>,
    evicted: Arc<Notify>,
}

/// 切り離しの通知を待つ側
#[derive(Debug, Clone)]
pub struct EvictionSignal(Arc<Notify>);

impl PusherChannel {
    /// 容量 `capacity` の送信キューを作り、受信側と切り離し通知を返す
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<String>, EvictionSignal) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let evicted = Arc::new(Notify::new());
        let channel = Self {
            sender,
            evicted: evicted.clone(),
        };
        (channel, receiver, EvictionSignal(evicted))
    }

    pub fn try_send(&self, json: String) -> Result<(), TrySendError<String>> {
        self.sender.try_send(json)
    }

    /// 持ち主に切断を要求する（待機者がいなくても通知は保持される）
    pub fn evict(&self) {
        self.evicted.notify_one();
    }
}

impl EvictionSignal {
    /// 送信キューが切り離されるまで待つ
    pub async fn evicted(&self) {
        self.0.notified().await;
    }
}

/// ブロードキャスト結果
///
/// `failed > 0` は部分的な配信失敗（PartialBroadcastFailure）。
/// 呼び出し元はログに残すだけで、リクエスト自体は失敗させない。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn is_partial_failure(&self) -> bool {
        self.failed > 0
    }
}

/// MessagePusher trait
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// コネクションの送信キューを登録
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// コネクションの送信キューを登録解除（未登録なら何もしない）
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 1 コネクションへ送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数コネクションへ送信
    ///
    /// 1 コネクションへの失敗が他のコネクションへの配信を妨げてはならない。
    async fn broadcast(&self, targets: &[ConnectionId], event: &OutboundEvent) -> BroadcastReport;
}
