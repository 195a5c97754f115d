//! UseCase: 入力中通知
//!
//! 入力中イベントは永続化しない。取りこぼしは許容する。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - TypingUseCase::start() / stop() メソッド
//!
//! ### なぜこのテストが必要か
//! - 送信者自身には通知が返らないことを保証
//! - ルーム未参加の送信者は拒否ではなく自動参加になることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルームの他のメンバーへの通知
//! - 異常系：アクセス権のないチャット
//! - エッジケース：未参加の送信者の自動参加

use std::sync::Arc;

use crate::{
    domain::{
        BroadcastReport, ChatId, ChatRepository, ConnectionId, MessagePusher, OutboundEvent,
        RoomKey,
    },
    infrastructure::registry::{RoomMembership, SessionRegistry},
};

use super::{
    access::{authenticated_user, authorize_chat},
    error::ChatError,
};

/// 入力中通知のユースケース
pub struct TypingUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    sessions: Arc<SessionRegistry>,
    rooms: Arc<RoomMembership>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl TypingUseCase {
    /// 新しい TypingUseCase を作成
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        sessions: Arc<SessionRegistry>,
        rooms: Arc<RoomMembership>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            sessions,
            rooms,
            message_pusher,
        }
    }

    /// `typing:start`
    pub async fn start(
        &self,
        connection_id: ConnectionId,
        chat_id: &ChatId,
    ) -> Result<BroadcastReport, ChatError> {
        self.notify(connection_id, chat_id, true).await
    }

    /// `typing:stop`
    pub async fn stop(
        &self,
        connection_id: ConnectionId,
        chat_id: &ChatId,
    ) -> Result<BroadcastReport, ChatError> {
        self.notify(connection_id, chat_id, false).await
    }

    async fn notify(
        &self,
        connection_id: ConnectionId,
        chat_id: &ChatId,
        started: bool,
    ) -> Result<BroadcastReport, ChatError> {
        let user_id = authenticated_user(&self.sessions, &connection_id)?;

        let room = RoomKey::chat(chat_id);
        if !self.rooms.is_member(&room, &connection_id) {
            // 未参加なら権限を確認して参加させてから通知する
            authorize_chat(self.repository.as_ref(), chat_id, &user_id).await?;
            self.rooms.join(&room, connection_id);
            tracing::info!(
                "Connection '{}' auto-joined room '{}' on typing",
                connection_id,
                room
            );
        }

        let targets: Vec<ConnectionId> = self
            .rooms
            .members_of(&room)
            .into_iter()
            .filter(|id| *id != connection_id)
            .collect();

        let event = if started {
            OutboundEvent::TypingStarted {
                chat_id: chat_id.clone(),
                user_id,
            }
        } else {
            OutboundEvent::TypingStopped {
                chat_id: chat_id.clone(),
                user_id,
            }
        };

        Ok(self.message_pusher.broadcast(&targets, &event).await)
    }
}

#[cfg(test)]
mod tests {
    use tabichat_shared::time::FixedClock;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        domain::{PusherChannel, Timestamp, UserId},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryChatRepository,
        },
    };

    struct Fixture {
        usecase: TypingUseCase,
        repository: Arc<InMemoryChatRepository>,
        sessions: Arc<SessionRegistry>,
        rooms: Arc<RoomMembership>,
        pusher: Arc<WebSocketMessagePusher>,
    }

    fn create_fixture() -> Fixture {
        let repository = Arc::new(InMemoryChatRepository::new(Arc::new(FixedClock::new(
            1_000,
        ))));
        let sessions = Arc::new(SessionRegistry::new());
        let rooms = Arc::new(RoomMembership::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = TypingUseCase::new(
            repository.clone(),
            sessions.clone(),
            rooms.clone(),
            pusher.clone(),
        );
        Fixture {
            usecase,
            repository,
            sessions,
            rooms,
            pusher,
        }
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    async fn connect(fixture: &Fixture, user_id: &str) -> (ConnectionId, mpsc::Receiver<String>) {
        let id = fixture
            .sessions
            .admit(user(user_id), Timestamp::new(1_000))
            .connection
            .id;
        let (tx, rx, _) = PusherChannel::bounded(8);
        fixture.pusher.register_connection(id, tx).await;
        (id, rx)
    }

    #[tokio::test]
    async fn test_typing_excludes_sender() {
        // テスト項目: 入力中通知はルームの他のメンバーにだけ届く
        // given (前提条件):
        let fixture = create_fixture();
        let chat = fixture
            .repository
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let (alice, mut alice_rx) = connect(&fixture, "alice").await;
        let (bob, mut bob_rx) = connect(&fixture, "bob").await;
        fixture.rooms.join(&chat.room_key(), alice);
        fixture.rooms.join(&chat.room_key(), bob);

        // when (操作):
        let report = fixture.usecase.start(alice, &chat.id).await.unwrap();
        fixture.usecase.stop(alice, &chat.id).await.unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        let started: serde_json::Value = serde_json::from_str(&bob_rx.recv().await.unwrap()).unwrap();
        assert_eq!(started["event"], "typing:start");
        assert_eq!(started["data"]["userId"], "alice");
        assert_eq!(started["data"]["chatId"], chat.id.as_str());
        let stopped: serde_json::Value = serde_json::from_str(&bob_rx.recv().await.unwrap()).unwrap();
        assert_eq!(stopped["event"], "typing:stop");
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_typing_auto_joins_sender() {
        // テスト項目: 未参加の送信者は通知の前にルームへ自動参加する
        // given (前提条件): bob だけが参加済み
        let fixture = create_fixture();
        let chat = fixture
            .repository
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let (alice, _alice_rx) = connect(&fixture, "alice").await;
        let (bob, mut bob_rx) = connect(&fixture, "bob").await;
        fixture.rooms.join(&chat.room_key(), bob);

        // when (操作):
        fixture.usecase.start(alice, &chat.id).await.unwrap();

        // then (期待する結果):
        assert!(fixture.rooms.is_member(&chat.room_key(), &alice));
        assert!(bob_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_typing_in_forbidden_chat() {
        // テスト項目: アクセス権のないチャットでは自動参加せず Forbidden
        // given (前提条件):
        let fixture = create_fixture();
        let chat = fixture
            .repository
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let (mallory, _rx) = connect(&fixture, "mallory").await;

        // when (操作):
        let result = fixture.usecase.start(mallory, &chat.id).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ChatError::Forbidden(_))));
        assert!(!fixture.rooms.is_member(&chat.room_key(), &mallory));
    }
}
