//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() / execute_for_connection() メソッド
//! - 権限確認 → 永続化 → 最終アクティビティ更新 → ルームへの配信
//!
//! ### なぜこのテストが必要か
//! - 永続化に失敗したメッセージが配信されないことを保証（永続化が境界）
//! - 最終アクティビティ更新の失敗が送信を失敗させないことを確認
//! - ルームのメンバーだけに、送信順のまま届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルームメンバー全員（送信者を含む）への `message:new`、送信元への `message:sent`
//! - 異常系：アクセス権なし、永続化失敗
//! - エッジケース：ルームに誰もいない、最終アクティビティ更新の失敗

use std::sync::Arc;

use crate::{
    domain::{
        BroadcastReport, ChatId, ChatRepository, ConnectionId, Message, MessageContent,
        MessagePusher, OutboundEvent, UserId,
    },
    infrastructure::registry::{RoomMembership, SessionRegistry},
};

use super::{
    access::{authenticated_user, authorize_chat},
    error::ChatError,
};

/// 送信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// 永続化されたメッセージ
    pub message: Message,
    /// ルームへの配信結果（部分的な失敗は送信の失敗ではない）
    pub report: BroadcastReport,
}

/// メッセージ送信のユースケース
///
/// HTTP と WebSocket の両方の入口から同じ手順で呼ばれる。
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    sessions: Arc<SessionRegistry>,
    rooms: Arc<RoomMembership>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
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

    /// メッセージ送信を実行（HTTP の入口）
    ///
    /// # Arguments
    ///
    /// * `sender_id` - 認証済みの送信者
    /// * `chat_id` - 送信先チャット
    /// * `content` - メッセージ内容
    ///
    /// # Returns
    ///
    /// * `Ok(Delivery)` - 永続化済みのメッセージと配信結果
    /// * `Err(ChatError)` - NotFound / Forbidden / PersistenceFailure
    pub async fn execute(
        &self,
        sender_id: &UserId,
        chat_id: &ChatId,
        content: MessageContent,
    ) -> Result<Delivery, ChatError> {
        // 1. 権限確認
        let chat = authorize_chat(self.repository.as_ref(), chat_id, sender_id).await?;

        // 2. 永続化（ここで失敗したら配信しない）
        let message = self
            .repository
            .create_message(&chat.id, sender_id, content)
            .await
            .map_err(|e| {
                tracing::error!("Failed to persist message to chat '{}': {}", chat.id, e);
                ChatError::PersistenceFailure(e.to_string())
            })?;

        // 3. 最終アクティビティ更新（失敗してもメッセージは保存済み）
        if let Err(e) = self.repository.touch_chat(&chat.id).await {
            tracing::warn!("Failed to update activity of chat '{}': {}", chat.id, e);
        }

        // 4. ルームへの配信
        let room = chat.room_key();
        let targets = self.rooms.members_of(&room);
        let report = self
            .message_pusher
            .broadcast(&targets, &OutboundEvent::MessageNew(message.clone()))
            .await;
        if report.is_partial_failure() {
            tracing::warn!(
                "Message '{}' reached {} of {} connections in room '{}'",
                message.id,
                report.delivered,
                targets.len(),
                room
            );
        } else {
            tracing::debug!(
                "Message '{}' delivered to {} connections in room '{}'",
                message.id,
                report.delivered,
                room
            );
        }

        Ok(Delivery { message, report })
    }

    /// メッセージ送信を実行（WebSocket の入口）
    ///
    /// `execute` に加えて、送信元コネクションへ `message:sent` を返す。
    pub async fn execute_for_connection(
        &self,
        connection_id: ConnectionId,
        chat_id: &ChatId,
        content: MessageContent,
    ) -> Result<Delivery, ChatError> {
        let sender_id = authenticated_user(&self.sessions, &connection_id)?;
        let delivery = self.execute(&sender_id, chat_id, content).await?;

        if let Err(e) = self
            .message_pusher
            .push_to(
                &connection_id,
                &OutboundEvent::MessageSent(delivery.message.clone()),
            )
            .await
        {
            tracing::warn!(
                "Failed to acknowledge message '{}' to connection '{}': {}",
                delivery.message.id,
                connection_id,
                e
            );
        }

        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use tabichat_shared::time::SteppingClock;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{
        domain::{
            Chat, ChatKind, GroupId, GroupMemberStatus, MessageId, MockChatRepository,
            PusherChannel, RepositoryError, RoomKey, Timestamp,
        },
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryChatRepository,
        },
    };

    struct Fixture {
        usecase: SendMessageUseCase,
        sessions: Arc<SessionRegistry>,
        rooms: Arc<RoomMembership>,
        pusher: Arc<WebSocketMessagePusher>,
    }

    fn create_fixture(repository: Arc<dyn ChatRepository>) -> Fixture {
        let sessions = Arc::new(SessionRegistry::new());
        let rooms = Arc::new(RoomMembership::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = SendMessageUseCase::new(
            repository,
            sessions.clone(),
            rooms.clone(),
            pusher.clone(),
        );
        Fixture {
            usecase,
            sessions,
            rooms,
            pusher,
        }
    }

    fn create_test_repository() -> Arc<InMemoryChatRepository> {
        Arc::new(InMemoryChatRepository::new(Arc::new(SteppingClock::new(
            1_000, 10,
        ))))
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn content(text: &str) -> MessageContent {
        MessageContent::new(text.to_string()).unwrap()
    }

    /// コネクションを登録し、指定ルームに参加させる
    async fn connect(
        fixture: &Fixture,
        user_id: &str,
        rooms: &[RoomKey],
    ) -> (ConnectionId, mpsc::Receiver<String>) {
        let id = fixture
            .sessions
            .admit(user(user_id), Timestamp::new(1_000))
            .connection
            .id;
        let (tx, rx, _) = PusherChannel::bounded(32);
        fixture.pusher.register_connection(id, tx).await;
        for room in rooms {
            fixture.rooms.join(room, id);
        }
        (id, rx)
    }

    fn next_event(rx: &mut mpsc::Receiver<String>) -> Option<serde_json::Value> {
        rx.try_recv()
            .ok()
            .map(|json| serde_json::from_str(&json).unwrap())
    }

    fn direct_chat() -> Chat {
        Chat::new(
            ChatId::new("c1".to_string()).unwrap(),
            ChatKind::Direct {
                user1: user("alice"),
                user2: user("bob"),
            },
            Timestamp::new(1_000),
        )
    }

    #[tokio::test]
    async fn test_send_message_reaches_room_members_only() {
        // テスト項目: ルームのメンバー（送信者を含む）にだけ message:new が届き、送信元に message:sent が届く
        // given (前提条件):
        let repository = create_test_repository();
        let fixture = create_fixture(repository.clone());
        let chat = repository
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let room = chat.room_key();
        let (alice, mut alice_rx) = connect(&fixture, "alice", &[room.clone()]).await;
        let (_bob, mut bob_rx) = connect(&fixture, "bob", &[room.clone()]).await;
        let (_charlie, mut charlie_rx) = connect(&fixture, "charlie", &[]).await;

        // when (操作): alice が送信
        let delivery = fixture
            .usecase
            .execute_for_connection(alice, &chat.id, content("hi"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(delivery.report.delivered, 2);
        assert!(!delivery.report.is_partial_failure());

        let to_bob = next_event(&mut bob_rx).unwrap();
        assert_eq!(to_bob["event"], "message:new");
        assert_eq!(to_bob["data"]["content"], "hi");
        assert_eq!(to_bob["data"]["isRead"], false);
        assert_eq!(to_bob["data"]["senderId"], "alice");

        assert_eq!(next_event(&mut alice_rx).unwrap()["event"], "message:new");
        assert_eq!(next_event(&mut alice_rx).unwrap()["event"], "message:sent");
        assert!(next_event(&mut charlie_rx).is_none());

        // メッセージは永続化されている
        let history = repository.list_messages(&chat.id).await.unwrap();
        assert_eq!(history, vec![delivery.message]);
    }

    #[tokio::test]
    async fn test_messages_arrive_in_send_order() {
        // テスト項目: 同じコネクションから順に送ったメッセージは、全メンバーに同じ順序で届く
        // given (前提条件):
        let repository = create_test_repository();
        let fixture = create_fixture(repository.clone());
        let chat = repository
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let (alice, _alice_rx) = connect(&fixture, "alice", &[chat.room_key()]).await;
        let (_bob, mut bob_rx) = connect(&fixture, "bob", &[chat.room_key()]).await;

        // when (操作):
        for i in 0..10 {
            fixture
                .usecase
                .execute_for_connection(alice, &chat.id, content(&format!("msg-{}", i)))
                .await
                .unwrap();
        }

        // then (期待する結果):
        for i in 0..10 {
            let event = next_event(&mut bob_rx).unwrap();
            assert_eq!(event["data"]["content"], format!("msg-{}", i));
        }
    }

    #[tokio::test]
    async fn test_group_message_reaches_accepted_members() {
        // テスト項目: 承認済みメンバー 3 人のグループで 1 人が送ると、他の 2 人に届き、部外者には届かない
        // given (前提条件):
        let repository = create_test_repository();
        let fixture = create_fixture(repository.clone());
        let group = GroupId::new("g1".to_string()).unwrap();
        for name in ["alice", "bob", "carol"] {
            repository
                .upsert_group_member(group.clone(), user(name), GroupMemberStatus::Accepted)
                .await;
        }
        let chat = repository.find_or_create_group_chat(&group).await.unwrap();
        let room = chat.room_key();
        let (alice, _alice_rx) = connect(&fixture, "alice", &[room.clone()]).await;
        let (_bob, mut bob_rx) = connect(&fixture, "bob", &[room.clone()]).await;
        let (_carol, mut carol_rx) = connect(&fixture, "carol", &[room.clone()]).await;
        let (_dave, mut dave_rx) = connect(&fixture, "dave", &[]).await;

        // when (操作):
        fixture
            .usecase
            .execute_for_connection(alice, &chat.id, content("hello group"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(next_event(&mut bob_rx).unwrap()["event"], "message:new");
        assert_eq!(next_event(&mut carol_rx).unwrap()["event"], "message:new");
        assert!(next_event(&mut dave_rx).is_none());
    }

    #[tokio::test]
    async fn test_send_message_forbidden_for_outsider() {
        // テスト項目: 参加者でないユーザーの送信は Forbidden で、何も保存されない
        // given (前提条件):
        let repository = create_test_repository();
        let fixture = create_fixture(repository.clone());
        let chat = repository
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();

        // when (操作):
        let result = fixture
            .usecase
            .execute(&user("mallory"), &chat.id, content("hi"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(ChatError::Forbidden(_))));
        assert!(repository.list_messages(&chat.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_from_unregistered_connection() {
        // テスト項目: 未登録コネクションからの送信は Unauthorized
        let fixture = create_fixture(create_test_repository());

        let result = fixture
            .usecase
            .execute_for_connection(
                ConnectionId::generate(),
                &ChatId::new("c1".to_string()).unwrap(),
                content("hi"),
            )
            .await;

        assert_eq!(result, Err(ChatError::Unauthorized));
    }

    #[tokio::test]
    async fn test_persistence_failure_skips_broadcast() {
        // テスト項目: 永続化に失敗したら配信しない
        // given (前提条件):
        let mut repository = MockChatRepository::new();
        repository
            .expect_find_chat()
            .returning(|_| Ok(Some(direct_chat())));
        repository
            .expect_create_message()
            .returning(|_, _, _| Err(RepositoryError::Unavailable("db down".to_string())));
        repository.expect_touch_chat().never();
        let fixture = create_fixture(Arc::new(repository));
        let (_bob, mut bob_rx) = connect(&fixture, "bob", &[direct_chat().room_key()]).await;

        // when (操作):
        let result = fixture
            .usecase
            .execute(&user("alice"), &direct_chat().id, content("hi"))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(ChatError::PersistenceFailure(_))));
        assert!(next_event(&mut bob_rx).is_none());
    }

    #[tokio::test]
    async fn test_touch_failure_is_not_fatal() {
        // テスト項目: 最終アクティビティ更新の失敗は送信を失敗させない
        // given (前提条件):
        let mut repository = MockChatRepository::new();
        repository
            .expect_find_chat()
            .returning(|_| Ok(Some(direct_chat())));
        repository
            .expect_create_message()
            .returning(|chat_id, sender_id, content| {
                Ok(Message {
                    id: MessageId::new("m1".to_string()).unwrap(),
                    chat_id: chat_id.clone(),
                    sender_id: sender_id.clone(),
                    content,
                    is_read: false,
                    created_at: Timestamp::new(2_000),
                })
            });
        repository
            .expect_touch_chat()
            .times(1)
            .returning(|_| Err(RepositoryError::Unavailable("db down".to_string())));
        let fixture = create_fixture(Arc::new(repository));
        let (_bob, mut bob_rx) = connect(&fixture, "bob", &[direct_chat().room_key()]).await;

        // when (操作):
        let result = fixture
            .usecase
            .execute(&user("alice"), &direct_chat().id, content("hi"))
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap().message.id.as_str(), "m1");
        assert_eq!(next_event(&mut bob_rx).unwrap()["event"], "message:new");
    }

    #[tokio::test]
    async fn test_send_to_empty_room() {
        // テスト項目: ルームに誰もいなくても送信は成功する
        // given (前提条件):
        let repository = create_test_repository();
        let fixture = create_fixture(repository.clone());
        let chat = repository
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();

        // when (操作):
        let delivery = fixture
            .usecase
            .execute(&user("alice"), &chat.id, content("anyone?"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(delivery.report, BroadcastReport::default());
    }
}
