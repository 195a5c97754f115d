//! UseCase: セッション切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectSessionUseCase::execute() メソッド
//! - 全ルームからの退出、登録解除、オフライン通知
//!
//! ### なぜこのテストが必要か
//! - 切断後のコネクションがどのルームにも残らないことを保証
//! - 同一ユーザーの別接続が残っている間は offline を通知しないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：最後の接続の切断で `user:offline`
//! - エッジケース：複数接続のうち 1 本だけ切断、2 回目の切断（冪等）

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, MessagePusher, OutboundEvent},
    infrastructure::registry::{Removal, RoomMembership, SessionRegistry},
};

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    sessions: Arc<SessionRegistry>,
    rooms: Arc<RoomMembership>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectSessionUseCase {
    /// 新しい DisconnectSessionUseCase を作成
    pub fn new(
        sessions: Arc<SessionRegistry>,
        rooms: Arc<RoomMembership>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            sessions,
            rooms,
            message_pusher,
        }
    }

    /// 切断を実行
    ///
    /// ルーム退出 → 登録削除 → 送信キュー解除 の順で行い、どのルームにも
    /// 切断済みのコネクションが残らないようにする。冪等。
    ///
    /// 登録削除から `user:offline` の通知まではプレゼンスのロックを保持するため、
    /// 同じユーザーの新しい接続の `user:online` より後に古い offline が届くことはない。
    ///
    /// # Returns
    ///
    /// * `Some(Removal)` - 切断した
    /// * `None` - 既に切断済み
    pub async fn execute(&self, connection_id: ConnectionId) -> Option<Removal> {
        let left = self.rooms.leave_all(connection_id);
        let _presence = self.sessions.lock_presence().await;
        let removal = self.sessions.remove(&connection_id);
        self.message_pusher
            .unregister_connection(&connection_id)
            .await;

        let removal = removal?;
        tracing::info!(
            "Connection '{}' of user '{}' disconnected ({} rooms left)",
            connection_id,
            removal.connection.user_id,
            left.len()
        );

        if removal.user_offline {
            let targets = self.sessions.all_connection_ids();
            let report = self
                .message_pusher
                .broadcast(
                    &targets,
                    &OutboundEvent::UserOffline(removal.connection.user_id.clone()),
                )
                .await;
            if report.is_partial_failure() {
                tracing::warn!(
                    "user:offline for '{}' reached {} of {} sessions",
                    removal.connection.user_id,
                    report.delivered,
                    targets.len()
                );
            }
        }

        Some(removal)
    }
}
