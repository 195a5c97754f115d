//! InMemory Chat Repository 実装
//!
//! ドメイン層が定義する ChatRepository trait の具体的な実装。
//! チャット・メッセージ・グループメンバーを 1 つのロックの下に保持します。
//!
//! ## 一意性
//!
//! ストア全体を 1 つの `Mutex` で守っているため、「検索してなければ作成」は
//! 不可分に実行されます。RDB 実装では一意制約 + 衝突時の再取得で同じ保証を与えること。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tabichat_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    Chat, ChatId, ChatKind, ChatRepository, GroupId, GroupMemberStatus, Message, MessageContent,
    MessageId, RepositoryError, Timestamp, UserId,
};

#[derive(Debug, Default)]
struct Store {
    chats: HashMap<ChatId, Chat>,
    /// 挿入順（= 作成順）
    messages: Vec<Message>,
    group_members: HashMap<(GroupId, UserId), GroupMemberStatus>,
}

impl Store {
    fn is_accepted_member(&self, group_id: &GroupId, user_id: &UserId) -> bool {
        self.group_members
            .get(&(group_id.clone(), user_id.clone()))
            .is_some_and(|status| status.grants_access())
    }
}

/// インメモリ Chat Repository 実装
pub struct InMemoryChatRepository {
    store: Mutex<Store>,
    clock: Arc<dyn Clock>,
}

impl InMemoryChatRepository {
    /// 新しい InMemoryChatRepository を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            clock,
        }
    }

    /// グループメンバーの状態を登録・更新
    ///
    /// グループ参加申請の承認フロー（外部コラボレーター）から呼ばれる。
    pub async fn upsert_group_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
        status: GroupMemberStatus,
    ) {
        let mut store = self.store.lock().await;
        store.group_members.insert((group_id, user_id), status);
    }

    /// 保存されているチャット数
    pub async fn count_chats(&self) -> usize {
        self.store.lock().await.chats.len()
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn find_chat(&self, chat_id: &ChatId) -> Result<Option<Chat>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.chats.get(chat_id).cloned())
    }

    async fn find_or_create_direct_chat(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Chat, RepositoryError> {
        let mut store = self.store.lock().await;

        // 両方の順序で検索してから作成する
        if let Some(existing) = store.chats.values().find(|chat| chat.is_direct_between(a, b)) {
            return Ok(existing.clone());
        }

        let chat = Chat::new(
            ChatId::generate(),
            ChatKind::Direct {
                user1: a.clone(),
                user2: b.clone(),
            },
            self.now(),
        );
        store.chats.insert(chat.id.clone(), chat.clone());
        tracing::info!("Direct chat '{}' created between '{}' and '{}'", chat.id, a, b);
        Ok(chat)
    }

    async fn find_or_create_group_chat(&self, group_id: &GroupId) -> Result<Chat, RepositoryError> {
        let mut store = self.store.lock().await;

        if let Some(existing) = store
            .chats
            .values()
            .find(|chat| chat.group_id() == Some(group_id))
        {
            return Ok(existing.clone());
        }

        let chat = Chat::new(
            ChatId::generate(),
            ChatKind::Group {
                group_id: group_id.clone(),
            },
            self.now(),
        );
        store.chats.insert(chat.id.clone(), chat.clone());
        tracing::info!("Group chat '{}' created for group '{}'", chat.id, group_id);
        Ok(chat)
    }

    async fn list_chats_for_user(&self, user_id: &UserId) -> Result<Vec<Chat>, RepositoryError> {
        let store = self.store.lock().await;
        let mut chats: Vec<Chat> = store
            .chats
            .values()
            .filter(|chat| match &chat.kind {
                ChatKind::Direct { .. } => chat.is_direct_participant(user_id),
                ChatKind::Group { group_id } => store.is_accepted_member(group_id, user_id),
            })
            .cloned()
            .collect();
        chats.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(chats)
    }

    async fn group_member_status(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<Option<GroupMemberStatus>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .group_members
            .get(&(group_id.clone(), user_id.clone()))
            .copied())
    }

    async fn create_message(
        &self,
        chat_id: &ChatId,
        sender_id: &UserId,
        content: MessageContent,
    ) -> Result<Message, RepositoryError> {
        let mut store = self.store.lock().await;
        if !store.chats.contains_key(chat_id) {
            return Err(RepositoryError::ChatNotFound(chat_id.to_string()));
        }

        let message = Message {
            id: MessageId::generate(),
            chat_id: chat_id.clone(),
            sender_id: sender_id.clone(),
            content,
            is_read: false,
            created_at: self.now(),
        };
        store.messages.push(message.clone());
        Ok(message)
    }

    async fn touch_chat(&self, chat_id: &ChatId) -> Result<(), RepositoryError> {
        let now = self.now();
        let mut store = self.store.lock().await;
        let chat = store
            .chats
            .get_mut(chat_id)
            .ok_or_else(|| RepositoryError::ChatNotFound(chat_id.to_string()))?;
        chat.updated_at = now;
        Ok(())
    }

    async fn list_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>, RepositoryError> {
        let store = self.store.lock().await;
        let mut messages: Vec<Message> = store
            .messages
            .iter()
            .filter(|message| &message.chat_id == chat_id)
            .cloned()
            .collect();
        // 安定ソートなので同時刻は挿入順のまま
        messages.sort_by_key(|message| message.created_at);
        Ok(messages)
    }

    async fn mark_as_read(
        &self,
        chat_id: &ChatId,
        reader: &UserId,
    ) -> Result<usize, RepositoryError> {
        let mut store = self.store.lock().await;
        let mut updated = 0;
        for message in store
            .messages
            .iter_mut()
            .filter(|message| &message.chat_id == chat_id && &message.sender_id != reader)
        {
            if !message.is_read {
                message.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabichat_shared::time::SteppingClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - ダイレクト / グループチャットの find-or-create の一意性
    // - メッセージの永続化と履歴の順序
    // - 既読化が送信者自身のメッセージを変更しないこと
    //
    // 【なぜこのテストが必要か】
    // - 同じペアに 2 つのチャットができると、ルームが分裂してメッセージが届かなくなる
    // ========================================

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

    #[tokio::test]
    async fn test_direct_chat_is_unique_per_unordered_pair() {
        // テスト項目: A→B と B→A で同じチャットが返る
        // given (前提条件):
        let repo = create_test_repository();

        // when (操作):
        let first = repo
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let second = repo
            .find_or_create_direct_chat(&user("bob"), &user("alice"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(first.id, second.id);
        assert_eq!(repo.count_chats().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_direct_chat_creation_yields_one_chat() {
        // テスト項目: 同じペアへの同時作成でもチャットは 1 つ
        // given (前提条件):
        let repo = create_test_repository();

        // when (操作):
        let mut handles = Vec::new();
        for i in 0..20 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let (a, b) = if i % 2 == 0 {
                    (user("alice"), user("bob"))
                } else {
                    (user("bob"), user("alice"))
                };
                repo.find_or_create_direct_chat(&a, &b).await.unwrap().id
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        // then (期待する結果):
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(repo.count_chats().await, 1);
    }

    #[tokio::test]
    async fn test_group_chat_is_unique_per_group() {
        // テスト項目: 同じグループに対してはチャットが 1 つだけ作られる
        // given (前提条件):
        let repo = create_test_repository();
        let group = GroupId::new("g1".to_string()).unwrap();

        // when (操作):
        let first = repo.find_or_create_group_chat(&group).await.unwrap();
        let second = repo.find_or_create_group_chat(&group).await.unwrap();

        // then (期待する結果):
        assert_eq!(first.id, second.id);
        assert_eq!(first.group_id(), Some(&group));
    }

    #[tokio::test]
    async fn test_create_message_for_unknown_chat() {
        // テスト項目: 存在しないチャットへのメッセージはエラー
        let repo = create_test_repository();
        let chat_id = ChatId::new("missing".to_string()).unwrap();

        let result = repo
            .create_message(&chat_id, &user("alice"), content("hi"))
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::ChatNotFound("missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_messages_are_listed_in_creation_order() {
        // テスト項目: 履歴は作成順に並ぶ
        // given (前提条件):
        let repo = create_test_repository();
        let chat = repo
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();

        // when (操作):
        for text in ["one", "two", "three"] {
            repo.create_message(&chat.id, &user("alice"), content(text))
                .await
                .unwrap();
        }
        let messages = repo.list_messages(&chat.id).await.unwrap();

        // then (期待する結果):
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert!(messages.iter().all(|m| !m.is_read));
    }

    #[tokio::test]
    async fn test_mark_as_read_skips_own_messages() {
        // テスト項目: 既読化は相手のメッセージだけを対象にする
        // given (前提条件):
        let repo = create_test_repository();
        let chat = repo
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();
        repo.create_message(&chat.id, &user("alice"), content("from alice"))
            .await
            .unwrap();
        repo.create_message(&chat.id, &user("bob"), content("from bob"))
            .await
            .unwrap();

        // when (操作): bob が既読にする
        let updated = repo.mark_as_read(&chat.id, &user("bob")).await.unwrap();

        // then (期待する結果):
        assert_eq!(updated, 1);
        let messages = repo.list_messages(&chat.id).await.unwrap();
        assert!(messages[0].is_read); // alice のメッセージ
        assert!(!messages[1].is_read); // bob 自身のメッセージは変更されない

        // 2 回目は更新なし
        assert_eq!(repo.mark_as_read(&chat.id, &user("bob")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_chats_for_user_respects_group_status() {
        // テスト項目: 承認済みグループのチャットだけが一覧に含まれ、更新順に並ぶ
        // given (前提条件):
        let repo = create_test_repository();
        let accepted = GroupId::new("accepted".to_string()).unwrap();
        let pending = GroupId::new("pending".to_string()).unwrap();
        repo.upsert_group_member(accepted.clone(), user("alice"), GroupMemberStatus::Accepted)
            .await;
        repo.upsert_group_member(pending.clone(), user("alice"), GroupMemberStatus::Pending)
            .await;
        let direct = repo
            .find_or_create_direct_chat(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let accepted_chat = repo.find_or_create_group_chat(&accepted).await.unwrap();
        repo.find_or_create_group_chat(&pending).await.unwrap();
        repo.find_or_create_direct_chat(&user("bob"), &user("charlie"))
            .await
            .unwrap();

        // when (操作): ダイレクトチャットを更新してから一覧を取得
        repo.touch_chat(&direct.id).await.unwrap();
        let chats = repo.list_chats_for_user(&user("alice")).await.unwrap();

        // then (期待する結果):
        let ids: Vec<&ChatId> = chats.iter().map(|c| &c.id).collect();
        assert_eq!(ids, vec![&direct.id, &accepted_chat.id]);
    }

    #[tokio::test]
    async fn test_touch_unknown_chat() {
        // テスト項目: 存在しないチャットの更新はエラー
        let repo = create_test_repository();

        let result = repo
            .touch_chat(&ChatId::new("missing".to_string()).unwrap())
            .await;

        assert!(matches!(result, Err(RepositoryError::ChatNotFound(_))));
    }
}
