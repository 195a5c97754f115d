//! UseCase: セッション接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::authenticate() / admit() メソッド
//! - トークン検証、個人ルームへの自動参加、オンライン通知
//!
//! ### なぜこのテストが必要か
//! - 不正なトークンで部分的に登録された状態が残らないことを保証
//! - 同一ユーザーの複数接続でも個人ルームに全コネクションが入ることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：トークン検証と登録、全セッションへの `user:online`
//! - 異常系：トークン欠落・期限切れ
//! - エッジケース：同一ユーザーの 2 本目の接続

use std::sync::Arc;

use tabichat_shared::time::Clock;

use crate::{
    domain::{
        AuthError, Connection, MessagePusher, OutboundEvent, PusherChannel, Timestamp,
        TokenVerifier, UserId,
    },
    infrastructure::registry::{RoomMembership, SessionRegistry},
};

use super::error::ChatError;

/// セッション接続のユースケース
///
/// 接続は 2 段階で行う。
/// 1. `authenticate`: トランスポートのアップグレード前にトークンを検証する
/// 2. `admit`: アップグレード後に登録する（失敗する要素を持たない）
pub struct ConnectSessionUseCase {
    /// TokenVerifier（認証コラボレーターの抽象化）
    token_verifier: Arc<dyn TokenVerifier>,
    sessions: Arc<SessionRegistry>,
    rooms: Arc<RoomMembership>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectSessionUseCase {
    /// 新しい ConnectSessionUseCase を作成
    pub fn new(
        token_verifier: Arc<dyn TokenVerifier>,
        sessions: Arc<SessionRegistry>,
        rooms: Arc<RoomMembership>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            token_verifier,
            sessions,
            rooms,
            message_pusher,
            clock,
        }
    }

    /// トークンを検証してユーザー ID を返す
    ///
    /// # Returns
    ///
    /// * `Ok(UserId)` - 検証成功
    /// * `Err(ChatError::Unauthenticated)` - トークンの欠落・不正・期限切れ
    pub fn authenticate(&self, token: Option<&str>) -> Result<UserId, ChatError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        self.token_verifier.verify(token).map_err(|e| {
            tracing::warn!("Rejected session token: {}", e);
            ChatError::from(e)
        })
    }

    /// 認証済みユーザーのコネクションを登録する
    ///
    /// 1. Session Registry に登録
    /// 2. 送信キューを MessagePusher に登録
    /// 3. 個人ルーム（`user:<userId>`）に参加
    /// 4. 全セッションへ `user:online` を通知（接続したセッション自身を含む）
    pub async fn admit(&self, user_id: UserId, sender: PusherChannel) -> Connection {
        let connected_at = Timestamp::new(self.clock.now_millis());
        let _presence = self.sessions.lock_presence().await;
        let admission = self.sessions.admit(user_id, connected_at);
        let connection = admission.connection;

        self.message_pusher
            .register_connection(connection.id, sender)
            .await;
        self.rooms.join(&connection.personal_room(), connection.id);

        tracing::info!(
            "Connection '{}' admitted for user '{}'",
            connection.id,
            connection.user_id
        );

        let targets = self.sessions.all_connection_ids();
        let report = self
            .message_pusher
            .broadcast(&targets, &OutboundEvent::UserOnline(connection.user_id.clone()))
            .await;
        if report.is_partial_failure() {
            tracing::warn!(
                "user:online for '{}' reached {} of {} sessions",
                connection.user_id,
                report.delivered,
                targets.len()
            );
        }

        connection
    }
}
