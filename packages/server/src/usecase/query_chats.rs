//! UseCase: チャット一覧・詳細・履歴の取得

use std::sync::Arc;

use crate::domain::{Chat, ChatId, ChatRepository, Message, UserId};

use super::{access::authorize_chat, error::ChatError};

/// チャット取得のユースケース
pub struct QueryChatsUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
}

impl QueryChatsUseCase {
    /// 新しい QueryChatsUseCase を作成
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// ユーザーが参加しているチャット（最終アクティビティの新しい順）
    pub async fn list_chats(&self, user_id: &UserId) -> Result<Vec<Chat>, ChatError> {
        Ok(self.repository.list_chats_for_user(user_id).await?)
    }

    /// チャットとメッセージ履歴
    pub async fn get_chat(
        &self,
        user_id: &UserId,
        chat_id: &ChatId,
    ) -> Result<(Chat, Vec<Message>), ChatError> {
        let chat = authorize_chat(self.repository.as_ref(), chat_id, user_id).await?;
        let messages = self.repository.list_messages(&chat.id).await?;
        Ok((chat, messages))
    }

    /// メッセージ履歴（作成順）
    pub async fn get_messages(
        &self,
        user_id: &UserId,
        chat_id: &ChatId,
    ) -> Result<Vec<Message>, ChatError> {
        authorize_chat(self.repository.as_ref(), chat_id, user_id).await?;
        Ok(self.repository.list_messages(chat_id).await?)
    }
}
