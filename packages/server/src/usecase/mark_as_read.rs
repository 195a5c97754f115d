//! UseCase: 既読化
//!
//! 既読状態は配信しない。クライアントは次回の取得時に反映する。

use std::sync::Arc;

use crate::{
    domain::{ChatId, ChatRepository, ConnectionId, UserId},
    infrastructure::registry::SessionRegistry,
};

use super::{
    access::{authenticated_user, authorize_chat},
    error::ChatError,
};

/// 既読化のユースケース
pub struct MarkAsReadUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    sessions: Arc<SessionRegistry>,
}

impl MarkAsReadUseCase {
    /// 新しい MarkAsReadUseCase を作成
    pub fn new(repository: Arc<dyn ChatRepository>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            repository,
            sessions,
        }
    }

    /// 相手のメッセージをすべて既読にし、更新件数を返す
    pub async fn execute(&self, reader: &UserId, chat_id: &ChatId) -> Result<usize, ChatError> {
        authorize_chat(self.repository.as_ref(), chat_id, reader).await?;

        let updated = self
            .repository
            .mark_as_read(chat_id, reader)
            .await
            .map_err(|e| {
                tracing::error!("Failed to mark chat '{}' as read: {}", chat_id, e);
                ChatError::PersistenceFailure(e.to_string())
            })?;
        tracing::debug!(
            "User '{}' marked {} messages in chat '{}' as read",
            reader,
            updated,
            chat_id
        );
        Ok(updated)
    }

    /// WebSocket の入口
    pub async fn execute_for_connection(
        &self,
        connection_id: ConnectionId,
        chat_id: &ChatId,
    ) -> Result<usize, ChatError> {
        let reader = authenticated_user(&self.sessions, &connection_id)?;
        self.execute(&reader, chat_id).await
    }
}
