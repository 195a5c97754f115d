//! Repository trait 定義
//!
//! 永続化コラボレーター（チャット・メッセージ・グループメンバーの保存先）への
//! インターフェース。具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    Chat, ChatId, GroupId, GroupMemberStatus, Message, MessageContent, RepositoryError, UserId,
};

/// Chat Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
///
/// ## 一意性
///
/// `find_or_create_*` は「検索してなければ作成」をストア側で不可分に行うこと。
/// 同じペア・同じグループに対する同時呼び出しでもチャットは 1 つしか作られない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// チャットを取得
    async fn find_chat(&self, chat_id: &ChatId) -> Result<Option<Chat>, RepositoryError>;

    /// 2 ユーザー間のダイレクトチャットを取得（なければ作成）
    ///
    /// ペアは順不同で検索する。
    async fn find_or_create_direct_chat(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Chat, RepositoryError>;

    /// グループのチャットを取得（なければ作成）
    async fn find_or_create_group_chat(&self, group_id: &GroupId) -> Result<Chat, RepositoryError>;

    /// ユーザーがアクセスできるチャット一覧（updated_at の降順）
    async fn list_chats_for_user(&self, user_id: &UserId) -> Result<Vec<Chat>, RepositoryError>;

    /// グループメンバーの承認状態（メンバーでなければ `None`）
    async fn group_member_status(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<Option<GroupMemberStatus>, RepositoryError>;

    /// メッセージを永続化（ID と作成時刻はストアが採番）
    async fn create_message(
        &self,
        chat_id: &ChatId,
        sender_id: &UserId,
        content: MessageContent,
    ) -> Result<Message, RepositoryError>;

    /// チャットの最終アクティビティ時刻を更新
    async fn touch_chat(&self, chat_id: &ChatId) -> Result<(), RepositoryError>;

    /// メッセージ履歴（作成順）
    async fn list_messages(&self, chat_id: &ChatId) -> Result<Vec<Message>, RepositoryError>;

    /// `reader` 以外が送信した未読メッセージを既読にし、更新件数を返す
    async fn mark_as_read(&self, chat_id: &ChatId, reader: &UserId)
    -> Result<usize, RepositoryError>;
}
